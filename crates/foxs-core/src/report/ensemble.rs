//! Parsing of `ensembles_size_N.txt` files written by the multi-state
//! fitter. Each file lists candidate ensembles of N states; a score line
//! (`1 | 2.33 | x1 2.33 (1.02, 0.50)`) is followed by one member line per
//! state (`   1  | 0.50 (1.00, 1.00) | model_m1.pdb.dat (0.27)`).

use crate::domain::{FoxsError, JobResult};
use crate::report::read_rg_table;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Largest ensemble size shown in the score histogram.
pub const MAX_ENSEMBLE_STATES: usize = 4;
/// Number of top-scoring ensembles considered per size.
pub const MAX_SCORED_MODELS: usize = 10;

/// Web palette for per-size ensemble traces, indexed by `size - 1`.
pub const STATE_COLORS: [&str; 5] = ["x1a9850", "xe26261", "x3288bd", "x00FFFF", "xA6CEE3"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnsembleScoreSummary {
    /// Number of states in each ensemble of this file.
    pub state_count: usize,
    /// Score of the best ensemble.
    pub best_score: f64,
    /// Score difference between the worst considered ensemble and the
    /// best.
    pub score_spread: f64,
}

/// Scan an ensemble file for the best and worst scores among the first
/// `max_models` ensembles, counting the states of the top ensemble along
/// the way.
pub fn score_summary(path: &Path, max_models: usize) -> JobResult<EnsembleScoreSummary> {
    let contents = fs::read_to_string(path).map_err(|source| {
        FoxsError::io(
            "IO.ENSEMBLE_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    let mut state_count = 0usize;
    let mut model_number = 0usize;
    let mut best_score = 0.0f64;
    let mut last_score = 0.0f64;
    for line in contents.lines() {
        if line.contains(" x1 ") {
            let fields: Vec<&str> = line.split('|').collect();
            let number = fields[0].trim();
            if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            model_number = number.parse().map_err(|_| {
                FoxsError::tool(
                    "RUN.ENSEMBLE_SCORE",
                    format!("unreadable ensemble number in '{}'", path.display()),
                )
            })?;
            if model_number > max_models {
                break;
            }
            last_score = parse_score(fields.get(1).copied().unwrap_or(""), path)?;
            if best_score == 0.0 {
                best_score = last_score;
            }
        } else if model_number == 1 {
            state_count += 1;
        }
    }
    Ok(EnsembleScoreSummary {
        state_count,
        best_score,
        score_spread: last_score - best_score,
    })
}

fn parse_score(field: &str, path: &Path) -> JobResult<f64> {
    field.trim().parse::<f64>().map_err(|_| {
        FoxsError::tool(
            "RUN.ENSEMBLE_SCORE",
            format!("unreadable ensemble score in '{}'", path.display()),
        )
    })
}

/// One structure of a multi-state model, with its fitted weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateMember {
    pub structure: String,
    pub weight: f64,
    pub radius_of_gyration: Option<f64>,
    pub index: usize,
}

/// The best-scoring ensemble of a given size, as shown on the result
/// page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiStateModel {
    pub state_count: usize,
    pub score: f64,
    pub c1: f64,
    pub c2: f64,
    pub members: Vec<StateMember>,
    pub dat_file: String,
    pub fit_file: String,
    pub color: String,
}

/// Read the best ensemble of each size from 2 up to `max_states`,
/// attaching radii of gyration from the captured `rg` table when present.
pub fn collect_multi_state_models(
    dir: &Path,
    max_states: usize,
) -> JobResult<Vec<MultiStateModel>> {
    let rg_path = dir.join(crate::commands::RG_CAPTURE_FILE);
    let rg = if rg_path.exists() {
        read_rg_table(&rg_path)?
    } else {
        BTreeMap::new()
    };

    let mut models = Vec::new();
    for size in 2..=max_states {
        let path = dir.join(format!("ensembles_size_{}.txt", size));
        if !path.exists() {
            continue;
        }
        models.push(read_best_ensemble(&path, size, &rg)?);
    }
    Ok(models)
}

fn read_best_ensemble(
    path: &Path,
    state_count: usize,
    rg: &BTreeMap<String, f64>,
) -> JobResult<MultiStateModel> {
    let contents = fs::read_to_string(path).map_err(|source| {
        FoxsError::io(
            "IO.ENSEMBLE_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    let mut lines = contents.lines();
    let (score, c1, c2) = loop {
        let Some(line) = lines.next() else {
            return Err(FoxsError::tool(
                "RUN.ENSEMBLE_MISSING",
                format!("no ensemble record found in '{}'", path.display()),
            ));
        };
        if !line.contains(" x1 ") {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() < 3 || fields[0].trim() != "1" {
            continue;
        }
        let score = parse_score(fields[1], path)?;
        let (c1, c2) = parse_parameter_pair(fields[2], path)?;
        break (score, c1, c2);
    };

    let mut members = Vec::with_capacity(state_count);
    for index in 0..state_count {
        let Some(line) = lines.next() else {
            return Err(FoxsError::tool(
                "RUN.ENSEMBLE_MEMBER",
                format!("truncated ensemble record in '{}'", path.display()),
            ));
        };
        members.push(parse_member(line, index, rg, path)?);
    }

    Ok(MultiStateModel {
        state_count,
        score,
        c1,
        c2,
        members,
        dat_file: format!("multi_state_model_{}_1_1.dat", state_count),
        fit_file: format!("multi_state_model_{}_1_1.fit", state_count),
        color: STATE_COLORS[state_count - 1].to_owned(),
    })
}

/// Extract `(c1, c2)` from a score field like ` x1 2.33 (1.02, 0.50)`.
fn parse_parameter_pair(field: &str, path: &Path) -> JobResult<(f64, f64)> {
    let error = || {
        FoxsError::tool(
            "RUN.ENSEMBLE_SCORE",
            format!("unreadable c1/c2 pair in '{}'", path.display()),
        )
    };
    let open = field.find('(').ok_or_else(error)?;
    let close = field[open..].find(')').ok_or_else(error)? + open;
    let (c1, c2) = field[open + 1..close].split_once(',').ok_or_else(error)?;
    Ok((
        c1.trim().parse().map_err(|_| error())?,
        c2.trim().parse().map_err(|_| error())?,
    ))
}

fn parse_member(
    line: &str,
    index: usize,
    rg: &BTreeMap<String, f64>,
    path: &Path,
) -> JobResult<StateMember> {
    let error = || {
        FoxsError::tool(
            "RUN.ENSEMBLE_MEMBER",
            format!("unreadable ensemble member in '{}'", path.display()),
        )
    };
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 3 {
        return Err(error());
    }
    let weight = fields[1]
        .split_whitespace()
        .next()
        .ok_or_else(error)?
        .parse::<f64>()
        .map_err(|_| error())?;
    let dat_name = fields[2].split_whitespace().next().ok_or_else(error)?;
    let structure = dat_name.strip_suffix(".dat").unwrap_or(dat_name).to_owned();
    let radius_of_gyration = rg.get(&structure).copied();
    Ok(StateMember {
        structure,
        weight,
        radius_of_gyration,
        index,
    })
}
