//! Job orchestration: drives the external tools over a staged job
//! directory and records progress in the job log.

use crate::commands::{
    self, ENSEMBLE_FILE_LIST, ToolCommand, foxs_command, multi_foxs_command,
    validate_profile_command, validated_profile_name,
};
use crate::domain::{FoxsError, JobResult, JobState};
use crate::job::{JOB_LOG_FILE, JobParameters, write_job_state};
use crate::multimodel::prepare_multimodel;
use crate::plots::{
    CANVAS_SCRIPT_FILE, HISTOGRAM_SCRIPT_FILE, write_canvas_script, write_states_histogram,
};
use crate::report::{MAX_ENSEMBLE_STATES, MAX_SCORED_MODELS};
use crate::results::{assemble_results, write_summary};
use globset::Glob;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Executes one external tool invocation inside a job directory. Tests
/// substitute a fake that fabricates the tool outputs.
pub trait ToolRunner {
    fn run(&self, workdir: &Path, command: &ToolCommand) -> JobResult<()>;
}

/// Runs tools as real subprocesses, appending their output to the job
/// log (or to the command's capture file).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(&self, workdir: &Path, command: &ToolCommand) -> JobResult<()> {
        debug!(program = %command.program, args = ?command.args, "running tool");
        let stdout_path = match &command.stdout_capture {
            Some(file) => workdir.join(file),
            None => workdir.join(JOB_LOG_FILE),
        };
        let stdout = open_sink(&stdout_path, command.stdout_capture.is_none())?;
        let stderr = open_sink(&workdir.join(JOB_LOG_FILE), true)?;

        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|source| {
                FoxsError::io(
                    "IO.TOOL_SPAWN",
                    format!("failed to start '{}': {}", command.program, source),
                )
            })?;
        if !status.success() {
            return Err(FoxsError::tool(
                "RUN.TOOL_EXIT",
                format!("'{}' exited with {}", command.program, status),
            ));
        }
        Ok(())
    }
}

fn open_sink(path: &Path, append: bool) -> JobResult<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .append(append)
        .write(true)
        .truncate(!append)
        .open(path)
        .map_err(|source| {
            FoxsError::io(
                "IO.TOOL_OUTPUT",
                format!("failed to open '{}': {}", path.display(), source),
            )
        })
}

/// Append a progress line to the job log, creating it if needed.
pub fn append_log(dir: &Path, line: &str) -> JobResult<()> {
    let path = dir.join(JOB_LOG_FILE);
    let mut file = open_sink(&path, true)?;
    writeln!(file, "{}", line).map_err(|source| {
        FoxsError::io(
            "IO.JOB_LOG_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Relative paths under `dir` matching a glob such as `**/*.plt`, sorted
/// for deterministic command lines.
pub fn matching_artifacts(dir: &Path, pattern: &str) -> JobResult<Vec<String>> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            FoxsError::internal(
                "SYS.BAD_GLOB",
                format!("invalid artifact pattern '{}': {}", pattern, source),
            )
        })?
        .compile_matcher();
    let mut found = Vec::new();
    walk(dir, Path::new(""), &mut |relative| {
        if matcher.is_match(relative) {
            found.push(relative.to_string_lossy().replace('\\', "/"));
        }
    })?;
    found.sort();
    Ok(found)
}

fn walk(dir: &Path, prefix: &Path, visit: &mut dyn FnMut(&Path)) -> JobResult<()> {
    let entries = fs::read_dir(dir).map_err(|source| {
        FoxsError::io(
            "IO.DIR_READ",
            format!("failed to read '{}': {}", dir.display(), source),
        )
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| {
            FoxsError::io(
                "IO.DIR_READ",
                format!("failed to read '{}': {}", dir.display(), source),
            )
        })?;
        let relative = prefix.join(entry.file_name());
        let path = entry.path();
        if path.is_dir() {
            walk(&path, &relative, visit)?;
        } else {
            visit(&relative);
        }
    }
    Ok(())
}

/// Computed-profile files for one input structure: either the file's own
/// `.dat` output or, for a split multi-model file, the per-submodel
/// outputs.
pub fn dat_files_for_structure(dir: &Path, structure: &str) -> Vec<String> {
    let own = format!("{}.dat", structure);
    if dir.join(&own).exists() {
        return vec![own];
    }
    let stem = structure
        .rsplit_once('.')
        .map_or(structure, |(stem, _)| stem);
    let mut files = Vec::new();
    for index in 1..=100 {
        for ext in ["pdb", "cif"] {
            let name = format!("{}_m{}.{}.dat", stem, index, ext);
            if dir.join(&name).exists() {
                files.push(name);
            }
        }
    }
    files
}

/// Run the full analysis for a loaded job: profile computation, plot
/// rendering, and the ensemble fit when more than one model competes for
/// an experimental profile.
pub fn run_job(dir: &Path, params: &JobParameters, runner: &dyn ToolRunner) -> JobResult<()> {
    prepare_multimodel(dir, params)?;

    append_log(dir, "Start profile computation analysis")?;
    runner.run(dir, &foxs_command(params, &params.input_files))?;

    let scripts = matching_artifacts(dir, "**/*.plt")?;
    if !scripts.is_empty() {
        runner.run(dir, &commands::gnuplot_command(&scripts))?;
    }
    if matching_artifacts(dir, "**/*.png")?.is_empty() {
        return Err(FoxsError::tool("RUN.NO_PLOTS", "No plot pngs produced"));
    }

    let mut dat_files = matching_artifacts(dir, "**/*.pdb.dat")?;
    dat_files.extend(matching_artifacts(dir, "**/*.cif.dat")?);
    if (params.input_files.len() > 1 || dat_files.len() > 1) && params.profile_file.is_some() {
        run_ensemble_fit(dir, params, runner)?;
    }

    let summary = assemble_results(dir, params)?;
    write_summary(dir, &summary)
}

fn run_ensemble_fit(
    dir: &Path,
    params: &JobParameters,
    runner: &dyn ToolRunner,
) -> JobResult<()> {
    let profile = params.profile_file.as_deref().ok_or_else(|| {
        FoxsError::internal("SYS.NO_PROFILE", "ensemble fit requires a profile")
    })?;
    runner.run(dir, &validate_profile_command(params, profile))?;
    let validated = validated_profile_name(profile);

    let mut profile_files = Vec::new();
    for structure in &params.input_files {
        profile_files.extend(dat_files_for_structure(dir, structure));
    }
    let list_path = dir.join(ENSEMBLE_FILE_LIST);
    let mut list = profile_files.join("\n");
    list.push('\n');
    fs::write(&list_path, list).map_err(|source| {
        FoxsError::io(
            "IO.ENSEMBLE_LIST_WRITE",
            format!("failed to write '{}': {}", list_path.display(), source),
        )
    })?;

    append_log(dir, "Start Ensemble computation")?;
    runner.run(
        dir,
        &multi_foxs_command(params, &validated, profile_files.len()),
    )?;
    if !dir.join("ensembles_size_1.txt").exists() {
        return Err(FoxsError::tool(
            "RUN.NO_ENSEMBLES",
            "No MultiFoXS ensembles produced",
        ));
    }

    write_states_histogram(dir, MAX_ENSEMBLE_STATES, MAX_SCORED_MODELS)?;
    runner.run(
        dir,
        &commands::gnuplot_command(&[HISTOGRAM_SCRIPT_FILE.to_owned()]),
    )?;
    write_canvas_script(dir, MAX_ENSEMBLE_STATES, profile)?;
    runner.run(
        dir,
        &commands::gnuplot_command(&[CANVAS_SCRIPT_FILE.to_owned()]),
    )?;

    append_log(dir, "Calculate Rg")?;
    runner.run(dir, &commands::compute_rg_command(params, &params.input_files))
}

/// Final disposition of a processed job directory.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed,
    /// The job failed; the diagnostic has been written to the job log for
    /// the result page to surface.
    Failed(FoxsError),
}

/// Process a staged job directory end to end. The job is always marked
/// DONE, even on failure, so the queue can hand the diagnostics back to
/// the submitter instead of retrying.
pub fn run_job_directory(dir: &Path, runner: &dyn ToolRunner) -> JobResult<JobOutcome> {
    write_job_state(dir, JobState::Started)?;
    let outcome = match JobParameters::load(dir).and_then(|params| {
        info!(directory = %dir.display(), structure = %params.structure_file, "processing job");
        run_job(dir, &params, runner)
    }) {
        Ok(()) => JobOutcome::Completed,
        Err(error) => {
            append_log(dir, &error.diagnostic_line())?;
            JobOutcome::Failed(error)
        }
    };
    write_job_state(dir, JobState::Done)?;
    Ok(outcome)
}
