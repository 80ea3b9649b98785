use super::{read_error, write_error};
use crate::commands::file_stem;
use crate::domain::JobResult;
use std::fs;
use std::path::Path;

/// Split a PDB file into one file per MODEL record. Returns the submodel
/// file names in model order; atom-less models are discarded.
pub fn split_pdb_models(dir: &Path, file_name: &str) -> JobResult<Vec<String>> {
    let path = dir.join(file_name);
    let contents = fs::read_to_string(&path).map_err(|source| read_error(&path, source))?;
    let stem = file_stem(file_name);

    let mut submodels: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut atom_count = 0usize;
    let mut model_index = 0usize;

    for line in contents.lines() {
        if line.starts_with("MODEL ") {
            flush_model(dir, &mut submodels, &mut current, atom_count, &mut model_index)?;
            atom_count = 0;
            model_index += 1;
            submodels.push(format!("{}_m{}.pdb", stem, model_index));
            current = Some(String::new());
        } else if line.starts_with("ENDMDL") {
            continue;
        } else if let Some(body) = current.as_mut() {
            if line.starts_with("ATOM") || line.starts_with("HETATM") {
                atom_count += 1;
            }
            body.push_str(line);
            body.push('\n');
        }
    }
    flush_model(dir, &mut submodels, &mut current, atom_count, &mut model_index)?;
    Ok(submodels)
}

fn flush_model(
    dir: &Path,
    submodels: &mut Vec<String>,
    current: &mut Option<String>,
    atom_count: usize,
    model_index: &mut usize,
) -> JobResult<()> {
    let Some(body) = current.take() else {
        return Ok(());
    };
    // Atom-less models never reach the filesystem; the numbering closes
    // over the gap they would have left.
    if atom_count == 0 {
        submodels.pop();
        *model_index -= 1;
        return Ok(());
    }
    let name = submodels.last().cloned().unwrap_or_default();
    let path = dir.join(&name);
    fs::write(&path, body).map_err(|source| write_error(&path, source))?;
    Ok(())
}
