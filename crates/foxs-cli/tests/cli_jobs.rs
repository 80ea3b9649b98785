//! Black-box tests of the foxs-rs binary over staged job directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_foxs-rs"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("binary should run")
}

fn stage_job(dir: &Path, data: &str, inputs: &[(&str, &str)]) {
    fs::write(dir.join("data.txt"), data).expect("data.txt should be writable");
    let list: Vec<&str> = inputs.iter().map(|(name, _)| *name).collect();
    fs::write(dir.join("inputFiles.txt"), list.join("\n"))
        .expect("inputFiles.txt should be writable");
    for (name, contents) in inputs {
        fs::write(dir.join(name), contents).expect("input should be writable");
    }
}

const SINGLE_MODEL_PDB: &str = "\
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
";

const TWO_MODEL_PDB: &str = "\
MODEL        1
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ENDMDL
MODEL        2
ATOM      1  N   ALA A   1      12.104   6.134  -6.504  1.00  0.00           N
ENDMDL
";

#[test]
fn check_reports_job_parameters() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_job(
        temp.path(),
        "1abc.pdb - - 0.50 500 1 1 1 0 0 0 0.00 1.00 3 1\n",
        &[("1abc.pdb", SINGLE_MODEL_PDB)],
    );
    let output = run_cli(temp.path(), &["check", "."]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("structure: 1abc.pdb"));
    assert!(stdout.contains("profile: none"));
    assert!(stdout.contains("input files: 1"));
    assert!(stdout.contains("foxs -j -g -m 3 -u 1 -q 0.5 -s 500 -- 1abc.pdb"));
}

#[test]
fn check_prints_the_ensemble_commands_for_profile_jobs() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_job(
        temp.path(),
        "two.pdb exp.dat - 0.50 500 1 1 1 0 0 0 0.00 1.00 2 1\n",
        &[("two.pdb", TWO_MODEL_PDB), ("exp.dat", "0.1 1.0 0.05\n")],
    );
    let output = run_cli(temp.path(), &["check", "."]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("validate_profile exp.dat -q 0.5"));
    assert!(stdout.contains("multi_foxs exp_v.dat filenames2.txt -s 1 -u 1 -q 0.5"));
}

#[test]
fn check_rejects_an_out_of_range_q() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_job(
        temp.path(),
        "1abc.pdb - - 1.50 500 1 1 1 0 0 0 0.00 1.00 3 1\n",
        &[("1abc.pdb", SINGLE_MODEL_PDB)],
    );
    let output = run_cli(temp.path(), &["check", "."]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.MAX_Q]"));
}

#[test]
fn split_writes_per_model_files() {
    let temp = TempDir::new().expect("tempdir should be created");
    fs::write(temp.path().join("two.pdb"), TWO_MODEL_PDB).expect("pdb should be writable");
    let output = run_cli(temp.path(), &["split", "two.pdb"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "two_m1.pdb\ntwo_m2.pdb\n");
    assert!(temp.path().join("two_m1.pdb").exists());
    assert!(temp.path().join("two_m2.pdb").exists());
}

#[test]
fn summary_prints_the_result_json() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_job(
        temp.path(),
        "1abc.pdb exp.dat - 0.50 500 1 1 1 0 0 0 0.00 1.00 3 1\n",
        &[("1abc.pdb", SINGLE_MODEL_PDB), ("exp.dat", "0.1 1.0 0.05\n")],
    );
    fs::write(
        temp.path().join("foxs.log"),
        "1abc.pdb exp.dat Chi^2 = 2.75 c1 = 1.02 c2 = 0.50 default\n",
    )
    .expect("log should be writable");
    let output = run_cli(temp.path(), &["summary", "--json", "."]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"name\": \"1abc\""));
    assert!(stdout.contains("\"png\": \"1abc_exp.png\""));
    assert!(stdout.contains("\"chi_square\": 2.75"));

    let text = run_cli(temp.path(), &["summary", "."]);
    assert!(text.status.success());
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("1abc.pdb: chi^2 2.75 c1 1.02 c2 0.5 (1abc_exp.dat)"));
}

#[test]
fn run_always_marks_the_job_done_and_exits_zero() {
    let temp = TempDir::new().expect("tempdir should be created");
    stage_job(
        temp.path(),
        "1abc.pdb - - 0.50 500 1 1 1 0 0 0 0.00 1.00 3 1\n",
        &[("1abc.pdb", SINGLE_MODEL_PDB)],
    );
    let output = run_cli(temp.path(), &["run", "."]);
    assert!(output.status.success());
    let state = fs::read_to_string(temp.path().join("job-state"))
        .expect("job-state should be readable");
    assert_eq!(state, "DONE\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("completed:") || stdout.starts_with("failed:"));
}

#[test]
fn run_treats_a_missing_data_file_as_a_job_failure() {
    let temp = TempDir::new().expect("tempdir should be created");
    fs::write(temp.path().join("inputFiles.txt"), "1abc.pdb\n")
        .expect("inputFiles.txt should be writable");
    let output = run_cli(temp.path(), &["run", "."]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("failed:"));
    let state = fs::read_to_string(temp.path().join("job-state"))
        .expect("job-state should be readable");
    assert_eq!(state, "DONE\n");
    let log = fs::read_to_string(temp.path().join("foxs.log"))
        .expect("log should be readable");
    assert!(log.contains("ERROR: [IO.DATA_READ]"));
}

#[test]
fn usage_errors_exit_with_the_input_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_cli(temp.path(), &["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.CLI_USAGE]"));
}
