mod commands;

use clap::Parser;
use foxs_core::domain::FoxsError;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let job_error = error.as_foxs_error();
            eprintln!("{}", job_error.diagnostic_line());
            job_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "foxs-rs", about = "SAXS profile fitting job backend")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Process a staged job directory end to end
    Run {
        /// Job directory containing data.txt and inputFiles.txt
        #[arg(value_name = "DIR", default_value = ".")]
        directory: PathBuf,
    },
    /// Validate a staged job and print the tool command lines
    Check {
        /// Job directory containing data.txt and inputFiles.txt
        #[arg(value_name = "DIR", default_value = ".")]
        directory: PathBuf,
    },
    /// Split multi-model PDB or mmCIF files into per-model files
    Split {
        /// Structure file names, relative to the job directory
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Directory holding the structure files
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },
    /// Print the result summary of a processed job directory
    Summary {
        /// Job directory that has been processed by `run`
        #[arg(value_name = "DIR", default_value = ".")]
        directory: PathBuf,

        /// Emit the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Run { directory } => commands::run_job_command(&directory),
        CliCommand::Check { directory } => commands::run_check_command(&directory),
        CliCommand::Split { files, directory } => commands::run_split_command(&directory, &files),
        CliCommand::Summary { directory, json } => {
            commands::run_summary_command(&directory, json)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Job(FoxsError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_foxs_error(&self) -> FoxsError {
        match self {
            Self::Usage(message) => FoxsError::input("INPUT.CLI_USAGE", message.clone()),
            Self::Job(error) => error.clone(),
            Self::Internal(error) => FoxsError::io("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<FoxsError> for CliError {
    fn from(error: FoxsError) -> Self {
        Self::Job(error)
    }
}
