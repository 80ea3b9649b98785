//! Command-line assembly for the external profile tools. The argument
//! order is load-bearing: result pages and downstream parsers rely on the
//! exact file names and flags produced here.

use crate::job::JobParameters;
use serde::Serialize;

pub const ENSEMBLE_FILE_LIST: &str = "filenames2.txt";
pub const RG_CAPTURE_FILE: &str = "rg";

/// Largest ensemble size requested from the multi-state fitter.
pub const MAX_ENSEMBLE_SUBSET: usize = 5;

/// One external tool invocation, ready for a [`crate::runner::ToolRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// File that receives the tool's stdout instead of the job log.
    pub stdout_capture: Option<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_owned(),
            args,
            stdout_capture: None,
        }
    }

    pub fn with_stdout_capture(mut self, file: &str) -> Self {
        self.stdout_capture = Some(file.to_owned());
        self
    }
}

/// Render a float the way the legacy tooling expects: integral values keep
/// one decimal place ("1.0"), everything else prints its shortest form.
pub fn decimal_token(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn push_fit_pins(params: &JobParameters, options: &mut Vec<String>) {
    if !params.fit_hydration {
        let density = decimal_token(params.hydration_density);
        options.push("--min_c2".to_owned());
        options.push(density.clone());
        options.push("--max_c2".to_owned());
        options.push(density);
    }
    if !params.fit_excluded_volume {
        let volume = decimal_token(params.excluded_volume);
        options.push("--min_c1".to_owned());
        options.push(volume.clone());
        options.push("--max_c1".to_owned());
        options.push(volume);
    }
}

/// Build the profile-computation command over the given structure files.
pub fn foxs_command(params: &JobParameters, structure_files: &[String]) -> ToolCommand {
    let mut options = vec![
        "-j".to_owned(),
        "-g".to_owned(),
        "-m".to_owned(),
        params.model_reading.as_code().to_string(),
        "-u".to_owned(),
        params.units.as_code().to_string(),
        "-q".to_owned(),
        decimal_token(params.max_q),
        "-s".to_owned(),
        params.profile_size.to_string(),
    ];
    if params.profile_file.is_some() {
        options.push("-p".to_owned());
    }
    push_fit_pins(params, &mut options);
    if !params.implicit_hydrogens {
        options.push("-h".to_owned());
    }
    if params.residue_level {
        options.push("-r".to_owned());
    }
    if params.offset {
        options.push("-o".to_owned());
    }
    if params.background_adjustment {
        options.push("-b".to_owned());
        options.push("0.2".to_owned());
    }
    options.push("--".to_owned());
    options.extend(structure_files.iter().cloned());
    if let Some(profile) = &params.profile_file {
        options.push(profile.clone());
    }
    ToolCommand::new("foxs", options)
}

/// Fit options for the multi-state fitter: units, q, the c1/c2 pins, and
/// the offset toggle. Hydrogen handling, residue level, and background
/// adjustment are profile-computation concerns and stay off this list.
pub fn multi_foxs_fit_options(params: &JobParameters) -> Vec<String> {
    let mut options = vec![
        "-u".to_owned(),
        params.units.as_code().to_string(),
        "-q".to_owned(),
        decimal_token(params.max_q),
    ];
    push_fit_pins(params, &mut options);
    if params.offset {
        options.push("-o".to_owned());
    }
    options
}

/// Name of the validated copy a profile check writes next to the input.
pub fn validated_profile_name(profile_file: &str) -> String {
    format!("{}_v.dat", file_stem(profile_file))
}

pub fn validate_profile_command(params: &JobParameters, profile_file: &str) -> ToolCommand {
    ToolCommand::new(
        "validate_profile",
        vec![
            profile_file.to_owned(),
            "-q".to_owned(),
            decimal_token(params.max_q),
        ],
    )
}

/// Build the multi-state fit over the validated profile and the list of
/// computed profile files.
pub fn multi_foxs_command(
    params: &JobParameters,
    validated_profile: &str,
    profile_count: usize,
) -> ToolCommand {
    let subset = profile_count.min(MAX_ENSEMBLE_SUBSET);
    let mut args = vec![
        validated_profile.to_owned(),
        ENSEMBLE_FILE_LIST.to_owned(),
        "-s".to_owned(),
        subset.to_string(),
    ];
    args.extend(multi_foxs_fit_options(params));
    ToolCommand::new("multi_foxs", args)
}

pub fn gnuplot_command(scripts: &[String]) -> ToolCommand {
    ToolCommand::new("gnuplot", scripts.to_vec())
}

/// Radius-of-gyration computation over the job's structures; the tool
/// reports on stdout, captured into the `rg` file.
pub fn compute_rg_command(params: &JobParameters, structure_files: &[String]) -> ToolCommand {
    let mut args = vec![
        "-m".to_owned(),
        params.model_reading.as_code().to_string(),
    ];
    args.extend(structure_files.iter().cloned());
    ToolCommand::new("compute_rg", args).with_stdout_capture(RG_CAPTURE_FILE)
}

pub(crate) fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}
