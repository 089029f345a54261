use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

fn branchgen() -> Command {
    if let Some(bin) = option_env!("CARGO_BIN_EXE_branchgen_cli") {
        Command::new(bin)
    } else {
        let mut cmd = Command::new("cargo");
        cmd.args(["run", "-q", "-p", "branchgen_cli", "--"]);
        cmd
    }
}

fn run(args: &[&str]) -> Output {
    branchgen()
        .args(args)
        .env("RUST_LOG", "warn")
        .current_dir(workspace_root())
        .output()
        .expect("failed to spawn branchgen_cli")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn count_reads_spec_file() {
    let temp_dir = tempdir().expect("temp dir");
    let spec_path = temp_dir.path().join("generator.json");
    fs::write(&spec_path, r#"{"pick": [1, 3], "count": 20}"#).expect("write spec");

    let output = run(&[
        "count",
        "--options",
        "5",
        "--spec",
        spec_path.to_str().expect("spec path"),
    ]);

    assert!(output.status.success(), "branchgen_cli exited with {:?}", output.status);
    assert_eq!(
        stdout_lines(&output),
        vec!["5 options → 20 variants (capped from 25)".to_string()]
    );
}

#[test]
fn list_resumes_and_limits() {
    let output = run(&[
        "list",
        "--options",
        "3",
        "--spec-json",
        r#"{"arrange": 2}"#,
        "--offset",
        "2",
        "--limit",
        "3",
        "--batch-size",
        "2",
    ]);

    assert!(output.status.success(), "branchgen_cli exited with {:?}", output.status);
    assert_eq!(
        stdout_lines(&output),
        vec!["2\t[1, 0]", "3\t[1, 2]", "4\t[2, 0]"]
    );
}

#[test]
fn list_writes_log_file() {
    let temp_dir = tempdir().expect("temp dir");
    let log_path = temp_dir.path().join("logs").join("branchgen.log");

    let output = branchgen()
        .args([
            "list",
            "--options",
            "2",
            "--format",
            "json",
            "--log-file",
            log_path.to_str().expect("log path"),
        ])
        .env("RUST_LOG", "info")
        .current_dir(workspace_root())
        .output()
        .expect("failed to spawn branchgen_cli");

    assert!(output.status.success(), "branchgen_cli exited with {:?}", output.status);
    let lines = stdout_lines(&output);
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(&lines[0]).expect("json line");
    assert_eq!(first["rank"], "0");
    assert_eq!(first["variant"]["flat"]["indices"], serde_json::json!([0]));

    let log = fs::read_to_string(&log_path).expect("log file written");
    assert!(log.contains("enumeration finished"), "log was: {log}");
}

#[test]
fn ambiguous_spec_fails_loudly() {
    let output = run(&[
        "count",
        "--options",
        "3",
        "--spec-json",
        r#"{"then_pick": 1, "then_arrange": 1}"#,
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid selection spec"), "stderr was: {stderr}");
}
