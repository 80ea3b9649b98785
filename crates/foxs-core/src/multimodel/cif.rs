use super::{read_error, write_error};
use crate::commands::file_stem;
use crate::domain::JobResult;
use std::fs;
use std::path::Path;

/// Data items carried into the per-submodel files, in the column order the
/// profile tool's mmCIF reader expects.
const OUTPUT_TAGS: [&str; 17] = [
    "group_PDB",
    "id",
    "type_symbol",
    "label_atom_id",
    "label_alt_id",
    "label_comp_id",
    "label_seq_id",
    "auth_seq_id",
    "pdbx_PDB_ins_code",
    "label_asym_id",
    "Cartn_x",
    "Cartn_y",
    "Cartn_z",
    "occupancy",
    "auth_asym_id",
    "B_iso_or_equiv",
    "pdbx_PDB_model_num",
];

/// Split the `_atom_site` table of an mmCIF file into one file per unique
/// model number, keeping the first-seen model order. Returns the submodel
/// file names.
pub fn split_cif_models(dir: &Path, file_name: &str) -> JobResult<Vec<String>> {
    let path = dir.join(file_name);
    let raw = fs::read(&path).map_err(|source| read_error(&path, source))?;
    // Legacy deposition files are often latin1; lossy decoding keeps the
    // atom table intact either way.
    let contents = String::from_utf8_lossy(&raw);
    let (tags, rows) = parse_atom_site_loop(&contents);
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let model_column = tags.iter().position(|tag| tag == "pdbx_PDB_model_num");
    let stem = file_stem(file_name);
    let mut submodels: Vec<String> = Vec::new();
    let mut bodies: Vec<String> = Vec::new();
    let mut model_order: Vec<String> = Vec::new();

    for row in &rows {
        let model = match model_column {
            Some(column) => row[column].clone(),
            None => ".".to_owned(),
        };
        let slot = match model_order.iter().position(|m| *m == model) {
            Some(slot) => slot,
            None => {
                model_order.push(model);
                submodels.push(format!("{}_m{}.cif", stem, model_order.len()));
                bodies.push(loop_header());
                model_order.len() - 1
            }
        };
        let body = &mut bodies[slot];
        for (index, tag) in OUTPUT_TAGS.iter().enumerate() {
            if index > 0 {
                body.push(' ');
            }
            let value = tags
                .iter()
                .position(|t| t == tag)
                .map_or(".", |column| row[column].as_str());
            push_cif_value(body, value);
        }
        body.push('\n');
    }

    for (name, mut body) in submodels.iter().zip(bodies) {
        body.push_str("#\n");
        let out = dir.join(name);
        fs::write(&out, body).map_err(|source| write_error(&out, source))?;
    }
    Ok(submodels)
}

fn loop_header() -> String {
    let mut header = String::from("loop_\n");
    for tag in OUTPUT_TAGS {
        header.push_str("_atom_site.");
        header.push_str(tag);
        header.push('\n');
    }
    header
}

fn push_cif_value(body: &mut String, value: &str) {
    if value.is_empty() {
        body.push('.');
    } else if value.contains(char::is_whitespace) {
        body.push('\'');
        body.push_str(value);
        body.push('\'');
    } else {
        body.push_str(value);
    }
}

/// Extract the `_atom_site` loop of the first data block: the tag
/// suffixes in file order and one token vector per atom row.
fn parse_atom_site_loop(contents: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut lines = contents.lines().peekable();
    let mut seen_block = false;
    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.starts_with("data_") {
            if seen_block {
                break;
            }
            seen_block = true;
            continue;
        }
        if trimmed != "loop_" {
            continue;
        }
        let mut tags = Vec::new();
        while let Some(tag_line) = lines.peek() {
            let tag_line = tag_line.trim();
            if let Some(suffix) = tag_line.strip_prefix("_atom_site.") {
                tags.push(suffix.to_owned());
                lines.next();
            } else {
                break;
            }
        }
        if tags.is_empty() {
            continue;
        }

        let mut rows = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for data_line in lines.by_ref() {
            let trimmed = data_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('_')
                || trimmed.starts_with("loop_")
                || trimmed.starts_with("data_")
            {
                break;
            }
            pending.extend(tokenize_cif_line(trimmed));
            while pending.len() >= tags.len() {
                rows.push(pending.drain(..tags.len()).collect());
            }
        }
        return (tags, rows);
    }
    (Vec::new(), Vec::new())
}

fn tokenize_cif_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '\'' || c == '"' {
            chars.next();
            let mut token = String::new();
            for inner in chars.by_ref() {
                if inner == c {
                    break;
                }
                token.push(inner);
            }
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&inner) = chars.peek() {
                if inner.is_whitespace() {
                    break;
                }
                token.push(inner);
                chars.next();
            }
            tokens.push(token);
        }
    }
    tokens
}
