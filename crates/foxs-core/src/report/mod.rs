//! Parsers for the text output the external tools leave behind in a job
//! directory: the profile tool's log, the radius-of-gyration table, and
//! the multi-state ensemble files.

mod ensemble;

pub use ensemble::{
    EnsembleScoreSummary, MAX_ENSEMBLE_STATES, MAX_SCORED_MODELS, MultiStateModel, STATE_COLORS,
    StateMember, collect_multi_state_models, score_summary,
};

use crate::domain::{FoxsError, JobResult};
use crate::job::JOB_LOG_FILE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Goodness-of-fit line for one structure against the experimental
/// profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitStatistics {
    pub chi_square: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Pull the Chi^2 fit lines out of the job log, keyed by structure file
/// name. A fit line reads
/// `file.pdb exp.dat Chi^2 = 0.5 c1 = 1.01 c2 = 2.0 ...`;
/// lines that do not parse are skipped.
pub fn parse_fit_log(dir: &Path) -> JobResult<BTreeMap<String, FitStatistics>> {
    let path = dir.join(JOB_LOG_FILE);
    let raw = fs::read(&path).map_err(|source| {
        FoxsError::io(
            "IO.JOB_LOG_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    let contents = String::from_utf8_lossy(&raw);

    let mut results = BTreeMap::new();
    for line in contents.lines() {
        if !line.contains("Chi^2") {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 11 {
            continue;
        }
        let parsed = (
            tokens[4].parse::<f64>(),
            tokens[7].parse::<f64>(),
            tokens[10].parse::<f64>(),
        );
        if let (Ok(chi_square), Ok(c1), Ok(c2)) = parsed {
            results.insert(tokens[0].to_owned(), FitStatistics { chi_square, c1, c2 });
        }
    }
    Ok(results)
}

/// Parse the captured radius-of-gyration table: one `name Rg= value` line
/// per structure.
pub fn read_rg_table(path: &Path) -> JobResult<BTreeMap<String, f64>> {
    let contents = fs::read_to_string(path).map_err(|source| {
        FoxsError::io(
            "IO.RG_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    let mut table = BTreeMap::new();
    for line in contents.lines() {
        let Some((name, value)) = line.split_once(" Rg=") else {
            continue;
        };
        if let Ok(rg) = value.trim().parse::<f64>() {
            table.insert(name.trim().to_owned(), rg);
        }
    }
    Ok(table)
}
