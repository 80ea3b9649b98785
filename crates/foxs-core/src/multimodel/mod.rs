//! Splitting of multi-model structure files into one file per submodel,
//! mirroring how the profile tool itself reads them: submodels are
//! numbered sequentially regardless of the number on the MODEL record, and
//! models without any atoms are dropped.

mod cif;
mod pdb;

use crate::domain::{FoxsError, JobResult, ModelReading};
use crate::job::{JobParameters, MULTI_MODEL_LIST_FILE};
use std::fs;
use std::path::Path;

pub use cif::split_cif_models;
pub use pdb::split_pdb_models;

/// Split one structure file into per-submodel files and return their
/// names. A file with a single model is left untouched and returned as is.
pub fn split_structure(dir: &Path, file_name: &str) -> JobResult<Vec<String>> {
    let mut submodels = if file_name.ends_with(".cif") {
        split_cif_models(dir, file_name)?
    } else {
        split_pdb_models(dir, file_name)?
    };
    // A single submodel carries no extra information; the profile tool
    // reads the original file directly.
    if submodels.len() == 1 {
        remove_submodel(dir, &submodels[0])?;
        submodels.clear();
    }
    if submodels.is_empty() {
        submodels.push(file_name.to_owned());
    }
    Ok(submodels)
}

/// For jobs that read MODELs as separate structures, split every input
/// file and record the resulting names in `multi-model-files.txt`.
pub fn prepare_multimodel(dir: &Path, params: &JobParameters) -> JobResult<()> {
    if params.model_reading != ModelReading::SeparateStructures {
        return Ok(());
    }
    let mut all = Vec::new();
    for file_name in &params.input_files {
        all.extend(split_structure(dir, file_name)?);
    }
    let path = dir.join(MULTI_MODEL_LIST_FILE);
    fs::write(&path, all.join("\n")).map_err(|source| {
        FoxsError::io(
            "IO.MULTI_MODEL_LIST_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

pub(super) fn remove_submodel(dir: &Path, name: &str) -> JobResult<()> {
    let path = dir.join(name);
    fs::remove_file(&path).map_err(|source| {
        FoxsError::io(
            "IO.SUBMODEL_REMOVE",
            format!("failed to remove '{}': {}", path.display(), source),
        )
    })
}

pub(super) fn read_error(path: &Path, source: std::io::Error) -> FoxsError {
    FoxsError::io(
        "IO.STRUCTURE_READ",
        format!("failed to read '{}': {}", path.display(), source),
    )
}

pub(super) fn write_error(path: &Path, source: std::io::Error) -> FoxsError {
    FoxsError::io(
        "IO.SUBMODEL_WRITE",
        format!("failed to write '{}': {}", path.display(), source),
    )
}
