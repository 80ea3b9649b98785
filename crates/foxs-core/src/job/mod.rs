//! Job-directory wire formats shared between the submission frontend and
//! the batch backend: `data.txt` (one line of space-separated parameters)
//! and `inputFiles.txt` (one structure file per line).

use crate::domain::{FoxsError, JobResult, JobState, ModelReading, ProfileUnits};
use std::fs;
use std::path::Path;

pub const DATA_FILE: &str = "data.txt";
pub const INPUT_LIST_FILE: &str = "inputFiles.txt";
pub const MULTI_MODEL_LIST_FILE: &str = "multi-model-files.txt";
pub const JOB_STATE_FILE: &str = "job-state";
pub const JOB_LOG_FILE: &str = "foxs.log";

/// Everything the backend needs to build command lines for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobParameters {
    pub structure_file: String,
    pub profile_file: Option<String>,
    pub email: Option<String>,
    pub max_q: f64,
    pub profile_size: u32,
    /// Fit the hydration layer density (c2); when false the pinned
    /// `hydration_density` value is used instead.
    pub fit_hydration: bool,
    /// Fit the excluded volume adjustment (c1); when false the pinned
    /// `excluded_volume` value is used instead.
    pub fit_excluded_volume: bool,
    pub implicit_hydrogens: bool,
    pub residue_level: bool,
    pub offset: bool,
    pub background_adjustment: bool,
    pub hydration_density: f64,
    pub excluded_volume: f64,
    pub model_reading: ModelReading,
    pub units: ProfileUnits,
    /// Structure files listed in `inputFiles.txt`, in submission order.
    pub input_files: Vec<String>,
}

impl JobParameters {
    /// Read `data.txt` and `inputFiles.txt` from a job directory.
    pub fn load(dir: &Path) -> JobResult<Self> {
        let data_path = dir.join(DATA_FILE);
        let data = fs::read_to_string(&data_path).map_err(|source| {
            FoxsError::io(
                "IO.DATA_READ",
                format!("failed to read '{}': {}", data_path.display(), source),
            )
        })?;
        let line = data.lines().next().unwrap_or("");
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 15 {
            return Err(FoxsError::input(
                "INPUT.DATA_FIELDS",
                format!(
                    "expected 15 fields in '{}', found {}",
                    DATA_FILE,
                    fields.len()
                ),
            ));
        }

        let list_path = dir.join(INPUT_LIST_FILE);
        let list = fs::read_to_string(&list_path).map_err(|source| {
            FoxsError::io(
                "IO.INPUT_LIST_READ",
                format!("failed to read '{}': {}", list_path.display(), source),
            )
        })?;
        let input_files: Vec<String> = list
            .lines()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        if input_files.is_empty() {
            return Err(FoxsError::input(
                "INPUT.NO_STRUCTURES",
                format!("'{}' does not list any structure files", INPUT_LIST_FILE),
            ));
        }

        Ok(Self {
            structure_file: fields[0].to_owned(),
            profile_file: optional_field(fields[1]),
            email: optional_field(fields[2]),
            max_q: parse_float(fields[3], "q")?,
            profile_size: parse_int(fields[4], "profile size")?,
            fit_hydration: fields[5] == "1",
            fit_excluded_volume: fields[6] == "1",
            implicit_hydrogens: fields[7] == "1",
            residue_level: fields[8] == "1",
            offset: fields[9] == "1",
            background_adjustment: fields[10] == "1",
            hydration_density: parse_float(fields[11], "hydration layer density")?,
            excluded_volume: parse_float(fields[12], "excluded volume adjustment")?,
            model_reading: ModelReading::from_code(fields[13])?,
            units: ProfileUnits::from_code(fields[14])?,
            input_files,
        })
    }

    /// Write `data.txt` and `inputFiles.txt` into a job directory.
    pub fn store(&self, dir: &Path) -> JobResult<()> {
        let line = format!(
            "{} {} {} {:.2} {} {} {} {} {} {} {} {:.2} {:.2} {} {}\n",
            self.structure_file,
            self.profile_file.as_deref().unwrap_or("-"),
            self.email.as_deref().unwrap_or("-"),
            self.max_q,
            self.profile_size,
            u8::from(self.fit_hydration),
            u8::from(self.fit_excluded_volume),
            u8::from(self.implicit_hydrogens),
            u8::from(self.residue_level),
            u8::from(self.offset),
            u8::from(self.background_adjustment),
            self.hydration_density,
            self.excluded_volume,
            self.model_reading,
            self.units,
        );
        write_job_file(&dir.join(DATA_FILE), &line)?;

        let mut list = self.input_files.join("\n");
        list.push('\n');
        write_job_file(&dir.join(INPUT_LIST_FILE), &list)
    }
}

fn optional_field(token: &str) -> Option<String> {
    // "None" is what the legacy frontend wrote for a missing e-mail.
    if token == "-" || token == "None" {
        None
    } else {
        Some(token.to_owned())
    }
}

fn parse_float(token: &str, name: &str) -> JobResult<f64> {
    token.parse::<f64>().map_err(|_| {
        FoxsError::input(
            "INPUT.DATA_NUMBER",
            format!("{} value '{}' is not a number", name, token),
        )
    })
}

fn parse_int(token: &str, name: &str) -> JobResult<u32> {
    token.parse::<u32>().map_err(|_| {
        FoxsError::input(
            "INPUT.DATA_NUMBER",
            format!("{} value '{}' is not an integer", name, token),
        )
    })
}

fn write_job_file(path: &Path, content: &str) -> JobResult<()> {
    fs::write(path, content).map_err(|source| {
        FoxsError::io(
            "IO.JOB_FILE_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Record the queue-visible state of the job.
pub fn write_job_state(dir: &Path, state: JobState) -> JobResult<()> {
    let path = dir.join(JOB_STATE_FILE);
    fs::write(&path, format!("{}\n", state.as_str())).map_err(|source| {
        FoxsError::io(
            "IO.JOB_STATE_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Validate the maximal q value from the submission form.
pub fn validate_max_q(q: f64) -> JobResult<f64> {
    if q <= 0.0 || q >= 1.0 {
        return Err(FoxsError::input(
            "INPUT.MAX_Q",
            "Invalid q value; it must be > 0 and < 1.0",
        ));
    }
    Ok(q)
}

/// Validate the profile size from the submission form.
pub fn validate_profile_size(size: u32) -> JobResult<u32> {
    if size <= 20 || size >= 2000 {
        return Err(FoxsError::input(
            "INPUT.PROFILE_SIZE",
            "Invalid profile size; it must be > 20 and < 2000",
        ));
    }
    Ok(size)
}

/// Resolve a fit-or-pin parameter pair from the submission form. When the
/// fit checkbox is on the default value is carried; otherwise the supplied
/// value must fall inside the accepted range.
pub fn resolve_fit_parameter(
    fit: bool,
    value: Option<f64>,
    default: f64,
    range: (f64, f64),
    name: &str,
) -> JobResult<(bool, f64)> {
    if fit {
        return Ok((true, default));
    }
    let value = value.unwrap_or(default);
    if value < range.0 || value > range.1 {
        return Err(FoxsError::input(
            "INPUT.FIT_PARAMETER",
            format!(
                "Invalid {} value; it must be > {:.2} and < {:.2}",
                name, range.0, range.1
            ),
        ));
    }
    Ok((false, value))
}
