use super::CliError;
use foxs_core::commands::{
    ToolCommand, foxs_command, multi_foxs_command, validate_profile_command,
    validated_profile_name,
};
use foxs_core::job::{JobParameters, validate_max_q, validate_profile_size};
use foxs_core::multimodel::split_structure;
use foxs_core::results::{JobSummary, SUMMARY_FILE, assemble_results};
use foxs_core::runner::{JobOutcome, SystemToolRunner, run_job_directory};
use std::path::Path;
use tracing::info;

/// Process a job directory. Mirrors the queue contract: a failed analysis
/// still exits zero, with the diagnostic in the job log and on stderr, so
/// the submitter sees the error instead of a silent requeue.
pub(super) fn run_job_command(directory: &Path) -> Result<i32, CliError> {
    match run_job_directory(directory, &SystemToolRunner)? {
        JobOutcome::Completed => {
            info!(directory = %directory.display(), "job completed");
            println!("completed: {}", directory.display());
        }
        JobOutcome::Failed(error) => {
            eprintln!("{}", error.diagnostic_line());
            println!("failed: {}", directory.display());
        }
    }
    Ok(0)
}

/// Validate the staged parameters and show the command lines the job
/// would run, without running anything.
pub(super) fn run_check_command(directory: &Path) -> Result<i32, CliError> {
    let params = JobParameters::load(directory)?;
    validate_max_q(params.max_q)?;
    validate_profile_size(params.profile_size)?;
    println!("structure: {}", params.structure_file);
    println!(
        "profile: {}",
        params.profile_file.as_deref().unwrap_or("none")
    );
    println!("input files: {}", params.input_files.len());
    println!("{}", render_command(&foxs_command(&params, &params.input_files)));
    if let Some(profile) = params.profile_file.as_deref() {
        println!("{}", render_command(&validate_profile_command(&params, profile)));
        // Computed-profile count is known only after the run; the subset
        // cap shown here uses the input count.
        let validated = validated_profile_name(profile);
        println!(
            "{}",
            render_command(&multi_foxs_command(&params, &validated, params.input_files.len()))
        );
    }
    Ok(0)
}

fn render_command(command: &ToolCommand) -> String {
    format!("{} {}", command.program, command.args.join(" "))
}

pub(super) fn run_split_command(directory: &Path, files: &[String]) -> Result<i32, CliError> {
    for file in files {
        for name in split_structure(directory, file)? {
            println!("{}", name);
        }
    }
    Ok(0)
}

pub(super) fn run_summary_command(directory: &Path, json: bool) -> Result<i32, CliError> {
    let params = JobParameters::load(directory)?;
    let summary = assemble_results(directory, &params)?;
    if json {
        let rendered = serde_json::to_string_pretty(&summary).map_err(|source| {
            CliError::Internal(anyhow::anyhow!("{} encode: {}", SUMMARY_FILE, source))
        })?;
        println!("{}", rendered);
    } else {
        print_summary_text(&summary);
    }
    Ok(0)
}

fn print_summary_text(summary: &JobSummary) {
    for structure in &summary.structures {
        match &structure.fit {
            Some(fit) => println!(
                "{}: chi^2 {} c1 {} c2 {} ({})",
                structure.file, fit.chi_square, fit.c1, fit.c2, fit.dat
            ),
            None => println!("{}: {}", structure.file, structure.profile.dat),
        }
    }
    for model in &summary.ensembles {
        println!(
            "ensemble of {}: score {} c1 {} c2 {}",
            model.state_count, model.score, model.c1, model.c2
        );
        for member in &model.members {
            match member.radius_of_gyration {
                Some(rg) => println!(
                    "  {} weight {} Rg {}",
                    member.structure, member.weight, rg
                ),
                None => println!("  {} weight {}", member.structure, member.weight),
            }
        }
    }
}
