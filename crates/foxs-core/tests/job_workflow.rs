//! End-to-end runs over staged job directories, with the external tools
//! replaced by a fake that fabricates their outputs.

use foxs_core::commands::ToolCommand;
use foxs_core::domain::JobResult;
use foxs_core::runner::{JobOutcome, ToolRunner, run_job_directory};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Fabricates the files each external tool would produce.
#[derive(Default)]
struct FakeToolRunner {
    invocations: RefCell<Vec<String>>,
    fail_program: Option<&'static str>,
}

impl FakeToolRunner {
    fn failing(program: &'static str) -> Self {
        Self {
            invocations: RefCell::new(Vec::new()),
            fail_program: Some(program),
        }
    }

    fn programs(&self) -> Vec<String> {
        self.invocations.borrow().clone()
    }
}

impl ToolRunner for FakeToolRunner {
    fn run(&self, workdir: &Path, command: &ToolCommand) -> JobResult<()> {
        self.invocations.borrow_mut().push(command.program.clone());
        if self.fail_program == Some(command.program.as_str()) {
            return Err(foxs_core::domain::FoxsError::tool(
                "RUN.TOOL_EXIT",
                format!("'{}' exited with exit status: 1", command.program),
            ));
        }
        match command.program.as_str() {
            "foxs" => fake_foxs(workdir, command),
            "gnuplot" => fake_gnuplot(workdir, command),
            "validate_profile" => fake_validate_profile(workdir, command),
            "multi_foxs" => fake_multi_foxs(workdir),
            "compute_rg" => fake_compute_rg(workdir, command),
            other => panic!("unexpected tool invocation: {}", other),
        }
        Ok(())
    }
}

fn structure_args(command: &ToolCommand) -> Vec<String> {
    let separator = command
        .args
        .iter()
        .position(|arg| arg == "--")
        .expect("option list should end with --");
    let mut files: Vec<String> = command.args[separator + 1..].to_vec();
    if command.args.iter().any(|arg| arg == "-p") {
        files.pop();
    }
    files
}

fn fake_foxs(workdir: &Path, command: &ToolCommand) {
    let with_profile = command.args.iter().any(|arg| arg == "-p");
    let mut log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(workdir.join("foxs.log"))
        .expect("log should open");
    for file in structure_args(command) {
        let stem = file.rsplit_once('.').map(|(s, _)| s).unwrap_or(&file);
        // One computed profile, one plot script per structure. Split
        // submodels listed in multi-model-files.txt get their own
        // outputs because foxs is handed the original file with -m 2.
        let listed = fs::read_to_string(workdir.join("multi-model-files.txt"))
            .ok()
            .map(|list| {
                list.lines()
                    .filter(|line| line.starts_with(&format!("{}_m", stem)))
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .filter(|submodels| !submodels.is_empty())
            .unwrap_or_else(|| vec![file.clone()]);
        for output in listed {
            let out_stem = output.rsplit_once('.').map(|(s, _)| s).unwrap_or(&output);
            fs::write(workdir.join(format!("{}.dat", output)), "# profile\n")
                .expect("dat should be writable");
            fs::write(workdir.join(format!("{}.plt", out_stem)), "plot\n")
                .expect("plt should be writable");
            if with_profile {
                writeln!(
                    log,
                    "{} exp.dat Chi^2 = 2.75 c1 = 1.02 c2 = 0.50 default c1/c2",
                    output
                )
                .expect("log should be writable");
            }
        }
    }
}

fn fake_gnuplot(workdir: &Path, command: &ToolCommand) {
    for script in &command.args {
        assert!(workdir.join(script).exists(), "missing script {}", script);
        if let Some(stem) = script.strip_suffix(".plt") {
            fs::write(workdir.join(format!("{}.png", stem)), "png\n")
                .expect("png should be writable");
        }
    }
}

fn fake_validate_profile(workdir: &Path, command: &ToolCommand) {
    let profile = &command.args[0];
    let stem = profile.rsplit_once('.').map(|(s, _)| s).unwrap_or(profile);
    fs::write(workdir.join(format!("{}_v.dat", stem)), "0.1 1.0 0.05\n")
        .expect("validated profile should be writable");
}

fn fake_multi_foxs(workdir: &Path) {
    let listed = fs::read_to_string(workdir.join("filenames2.txt"))
        .expect("profile list should exist");
    let dats: Vec<&str> = listed.lines().collect();
    assert!(dats.len() > 1, "ensemble fit needs competing profiles");
    fs::write(
        workdir.join("ensembles_size_1.txt"),
        format!(
            "1 | 4.50 | x1 4.50 (1.00, 0.00)\n    1   | 1.00 (1.00, 1.00) | {} (0.27)\n",
            dats[0]
        ),
    )
    .expect("ensemble file should be writable");
    fs::write(
        workdir.join("ensembles_size_2.txt"),
        format!(
            "1 | 2.33 | x1 2.33 (1.02, 0.50)\n\
             \u{20}   1   | 0.61 (1.00, 1.00) | {} (0.27)\n\
             \u{20}   2   | 0.39 (1.00, 1.00) | {} (0.27)\n",
            dats[0], dats[1]
        ),
    )
    .expect("ensemble file should be writable");
    for state in 1..=2 {
        fs::write(
            workdir.join(format!("multi_state_model_{}_1_1.fit", state)),
            "0.1 1.0 0.05 0.9\n",
        )
        .expect("fit file should be writable");
    }
}

fn fake_compute_rg(workdir: &Path, command: &ToolCommand) {
    let capture = command
        .stdout_capture
        .as_deref()
        .expect("rg output should be captured");
    let mut table = String::new();
    let listed = fs::read_to_string(workdir.join("filenames2.txt"))
        .expect("profile list should exist");
    for dat in listed.lines() {
        let structure = dat.strip_suffix(".dat").unwrap_or(dat);
        table.push_str(&format!("{} Rg= 21.40\n", structure));
    }
    fs::write(workdir.join(capture), table).expect("rg should be writable");
}

fn stage_job(data: &str, inputs: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().expect("tempdir should be created");
    fs::write(temp.path().join("data.txt"), data).expect("data.txt should be writable");
    let list: Vec<&str> = inputs.iter().map(|(name, _)| *name).collect();
    fs::write(temp.path().join("inputFiles.txt"), list.join("\n"))
        .expect("inputFiles.txt should be writable");
    for (name, contents) in inputs {
        fs::write(temp.path().join(name), contents).expect("input should be writable");
    }
    temp
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
fn single_structure_without_profile_completes() {
    let temp = stage_job(
        "1abc.pdb - - 0.50 500 1 1 1 0 0 0 0.00 1.00 3 1\n",
        &[("1abc.pdb", SINGLE_MODEL_PDB)],
    );
    let runner = FakeToolRunner::default();
    let outcome = run_job_directory(temp.path(), &runner).expect("run should succeed");
    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(runner.programs(), vec!["foxs", "gnuplot"]);

    let state = fs::read_to_string(temp.path().join("job-state"))
        .expect("job-state should be readable");
    assert_eq!(state, "DONE\n");

    let summary = fs::read_to_string(temp.path().join("summary.json"))
        .expect("summary should be readable");
    assert!(summary.contains("\"name\": \"1abc\""));
    assert!(summary.contains("\"fit\": null"));
    assert!(summary.contains("\"ensembles\": []"));
}

#[test]
fn split_multimodel_with_profile_runs_the_ensemble_fit() {
    let temp = stage_job(
        "two.pdb exp.dat - 0.50 500 1 1 1 0 0 0 0.00 1.00 2 1\n",
        &[("two.pdb", TWO_MODEL_PDB), ("exp.dat", "0.1 1.0 0.05\n")],
    );
    let runner = FakeToolRunner::default();
    let outcome = run_job_directory(temp.path(), &runner).expect("run should succeed");
    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(
        runner.programs(),
        vec![
            "foxs",
            "gnuplot",
            "validate_profile",
            "multi_foxs",
            "gnuplot",
            "gnuplot",
            "compute_rg"
        ]
    );

    let listed = fs::read_to_string(temp.path().join("filenames2.txt"))
        .expect("profile list should be readable");
    assert_eq!(listed, "two_m1.pdb.dat\ntwo_m2.pdb.dat\n");
    assert!(temp.path().join("chis").exists());
    assert!(temp.path().join("canvas_ensemble.plt").exists());
    assert!(temp.path().join("plotbar3.png").exists());

    let summary = fs::read_to_string(temp.path().join("summary.json"))
        .expect("summary should be readable");
    assert!(summary.contains("\"name\": \"two_m1\""));
    assert!(summary.contains("\"png\": \"two_m1_exp.png\""));
    assert!(summary.contains("\"dat_file\": \"multi_state_model_2_1_1.dat\""));
    assert!(summary.contains("\"radius_of_gyration\": 21.4"));
}

#[test]
fn failing_profile_tool_marks_the_job_done_with_a_diagnostic() {
    let temp = stage_job(
        "1abc.pdb - - 0.50 500 1 1 1 0 0 0 0.00 1.00 3 1\n",
        &[("1abc.pdb", SINGLE_MODEL_PDB)],
    );
    let runner = FakeToolRunner::failing("foxs");
    let outcome = run_job_directory(temp.path(), &runner).expect("run itself should succeed");
    let JobOutcome::Failed(error) = outcome else {
        panic!("job should have failed");
    };
    assert_eq!(error.code(), "RUN.TOOL_EXIT");

    let state = fs::read_to_string(temp.path().join("job-state"))
        .expect("job-state should be readable");
    assert_eq!(state, "DONE\n");
    let log = fs::read_to_string(temp.path().join("foxs.log"))
        .expect("log should be readable");
    assert!(log.contains("ERROR: [RUN.TOOL_EXIT]"));
}

#[test]
fn malformed_job_parameters_fail_before_any_tool_runs() {
    let temp = TempDir::new().expect("tempdir should be created");
    fs::write(temp.path().join("data.txt"), "1abc.pdb - -\n")
        .expect("data.txt should be writable");
    fs::write(temp.path().join("inputFiles.txt"), "1abc.pdb\n")
        .expect("inputFiles.txt should be writable");
    let runner = FakeToolRunner::default();
    let outcome = run_job_directory(temp.path(), &runner).expect("run itself should succeed");
    let JobOutcome::Failed(error) = outcome else {
        panic!("job should have failed");
    };
    assert_eq!(error.code(), "INPUT.DATA_FIELDS");
    assert!(runner.programs().is_empty());
}
