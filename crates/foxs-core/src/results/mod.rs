//! Assembly of the machine-readable result summary from the artifacts an
//! analysis run leaves in the job directory.

use crate::commands::file_stem;
use crate::domain::{FoxsError, JobResult};
use crate::job::{INPUT_LIST_FILE, JobParameters, MULTI_MODEL_LIST_FILE};
use crate::report::{MAX_ENSEMBLE_STATES, MultiStateModel, collect_multi_state_models, parse_fit_log};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const SUMMARY_FILE: &str = "summary.json";

/// Fit of one structure against the experimental profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub png: String,
    pub dat: String,
    pub chi_square: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Computed profile artifacts for one structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileResult {
    pub png: String,
    pub dat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureResult {
    /// Structure name without its file extension.
    pub name: String,
    /// The structure file the profile was computed from.
    pub file: String,
    /// Present only for jobs fitted against an experimental profile.
    pub fit: Option<FitResult>,
    pub profile: ProfileResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub structures: Vec<StructureResult>,
    pub ensembles: Vec<MultiStateModel>,
}

/// Structure files shown on the result page: the split submodels when the
/// job produced them, the submitted inputs otherwise.
pub fn job_structure_files(dir: &Path) -> JobResult<Vec<String>> {
    let multi = dir.join(MULTI_MODEL_LIST_FILE);
    let path = if multi.exists() {
        multi
    } else {
        dir.join(INPUT_LIST_FILE)
    };
    let contents = fs::read_to_string(&path).map_err(|source| {
        FoxsError::io(
            "IO.INPUT_LIST_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// The structure and profile fields of `data.txt`, without parsing the
/// whole parameter line.
pub fn job_input_names(dir: &Path) -> JobResult<(String, Option<String>)> {
    let path = dir.join(crate::job::DATA_FILE);
    let contents = fs::read_to_string(&path).map_err(|source| {
        FoxsError::io(
            "IO.DATA_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    let mut fields = contents.split_whitespace();
    let structure = fields.next().ok_or_else(|| {
        FoxsError::input(
            "INPUT.DATA_FIELDS",
            format!("'{}' is empty", crate::job::DATA_FILE),
        )
    })?;
    let profile = fields.next().filter(|token| *token != "-");
    Ok((structure.to_owned(), profile.map(str::to_owned)))
}

/// Join the fit log, ensemble files, and artifact naming conventions into
/// one summary.
pub fn assemble_results(dir: &Path, params: &JobParameters) -> JobResult<JobSummary> {
    let fit_stats = parse_fit_log(dir)?;
    let profile_stem = params.profile_file.as_deref().map(file_stem);

    let mut structures = Vec::new();
    for file in job_structure_files(dir)? {
        let stem = file_stem(&file).to_owned();
        let fit = profile_stem.and_then(|pstem| {
            fit_stats.get(&file).map(|stats| FitResult {
                png: format!("{}_{}.png", stem, pstem),
                dat: format!("{}_{}.dat", stem, pstem),
                chi_square: stats.chi_square,
                c1: stats.c1,
                c2: stats.c2,
            })
        });
        structures.push(StructureResult {
            name: stem.clone(),
            file: file.clone(),
            fit,
            profile: ProfileResult {
                png: format!("{}.png", stem),
                dat: format!("{}.dat", file),
            },
        });
    }

    let ensembles = collect_multi_state_models(dir, MAX_ENSEMBLE_STATES)?;
    Ok(JobSummary {
        structures,
        ensembles,
    })
}

/// Write the summary as pretty-printed JSON next to the other artifacts.
pub fn write_summary(dir: &Path, summary: &JobSummary) -> JobResult<()> {
    let rendered = serde_json::to_string_pretty(summary).map_err(|source| {
        FoxsError::internal(
            "SYS.SUMMARY_ENCODE",
            format!("failed to encode the result summary: {}", source),
        )
    })?;
    let path = dir.join(SUMMARY_FILE);
    fs::write(&path, rendered + "\n").map_err(|source| {
        FoxsError::io(
            "IO.SUMMARY_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}
