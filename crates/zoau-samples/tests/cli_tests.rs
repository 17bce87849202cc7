//! Integration tests for the zoau-samples CLI.
//!
//! These run the built binary with arguments that never reach a z/OS system.

use std::process::Command;

/// Get the path to the built binary.
fn get_bin_path() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("zoau-samples");
    path
}

/// Run the CLI with given arguments and return (stdout, stderr, exit code).
fn run_cli_code(args: &[&str]) -> (String, String, Option<i32>) {
    let output = Command::new(get_bin_path())
        .args(args)
        .env_remove("ZOAU_HOME")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code())
}

/// Run the CLI with given arguments and return (stdout, stderr, success).
fn run_cli(args: &[&str]) -> (String, String, bool) {
    let (stdout, stderr, code) = run_cli_code(args);
    (stdout, stderr, code == Some(0))
}

#[test]
fn test_help_command() {
    let (stdout, _, success) = run_cli(&["--help"]);
    assert!(success);
    for sub in [
        "create-sysin",
        "member-copy",
        "run-job",
        "job-sample",
        "run-rexx",
        "smpe-list",
        "smpe-global",
        "zcx-versions",
    ] {
        assert!(stdout.contains(sub), "missing {sub} in: {stdout}");
    }
}

#[test]
fn test_version_command() {
    let (stdout, _, success) = run_cli(&["--version"]);
    assert!(success);
    assert!(stdout.contains("zoau-samples"));
}

#[test]
fn test_create_sysin_writes_cp1047() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sysin");
    let (stdout, stderr, success) = run_cli(&[
        "create-sysin",
        file.to_str().unwrap(),
        " COPY OUTDD=OUT,INDD=IN",
        " SELECT MEMBER=(A)",
    ]);
    assert!(success, "Command failed with stderr: {}", stderr);
    assert!(stdout.contains("Input written to:"), "Output: {}", stdout);

    let bytes = std::fs::read(&file).unwrap();
    assert_eq!(bytes.iter().filter(|&&b| b == 0x15).count(), 2);
    assert_eq!(bytes.last(), Some(&0x15));
    // EBCDIC blank, not ASCII.
    assert_eq!(bytes[0], 0x40);
}

#[test]
fn test_create_sysin_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sysin");
    let (stdout, stderr, success) = run_cli(&[
        "--format",
        "json",
        "create-sysin",
        file.to_str().unwrap(),
        " LIST.",
    ]);
    assert!(success, "Command failed with stderr: {}", stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["records"], 1);
}

#[test]
fn test_create_sysin_rejects_long_line() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("sysin");
    let long = "X".repeat(73);
    let (_, stderr, code) = run_cli_code(&["create-sysin", file.to_str().unwrap(), &long]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("length: 73"), "Stderr: {}", stderr);
    assert!(!file.exists());
}

#[test]
fn test_zcx_versions_requires_registry() {
    let (_, stderr, code) = run_cli_code(&["zcx-versions"]);
    assert_eq!(code, Some(1));
    assert!(stderr.contains("No registry path specified."), "Stderr: {}", stderr);
}

#[test]
fn test_zcx_versions_missing_opercmd() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("zoau");
    let (_, stderr, code) = run_cli_code(&[
        "zcx-versions",
        "-p",
        dir.path().to_str().unwrap(),
        "--zoau-path",
        home.to_str().unwrap(),
    ]);
    assert_eq!(code, Some(3));
    assert!(stderr.contains("Not found:"), "Stderr: {}", stderr);
}

#[test]
fn test_smpe_list_missing_defaults_file() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = dir.path().join("missing.yaml");
    let (_, _, code) = run_cli_code(&[
        "smpe-list",
        "IBMUSER",
        "--defaults",
        defaults.to_str().unwrap(),
    ]);
    assert_eq!(code, Some(2));
}

#[test]
fn test_smpe_list_incomplete_defaults_file() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = dir.path().join("defaults.yaml");
    std::fs::write(&defaults, "SMPECSI:\n  dataset: SMPE.GLOBAL.CSI\n").unwrap();
    let (_, stderr, code) = run_cli_code(&[
        "smpe-list",
        "IBMUSER",
        "--defaults",
        defaults.to_str().unwrap(),
    ]);
    assert_eq!(code, Some(2));
    assert!(stderr.contains("Yaml file missing TEMP_DATASET:primary_space"), "Stderr: {}", stderr);
}

#[test]
fn test_smpe_list_zone_flag_with_missing_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = dir.path().join("missing.yaml");
    let (_, stderr, code) = run_cli_code(&[
        "smpe-list",
        "IBMUSER",
        "-z",
        "MVST100",
        "--defaults",
        defaults.to_str().unwrap(),
    ]);
    assert_eq!(code, Some(2), "Stderr: {}", stderr);
    assert!(!stderr.contains("panicked"), "Stderr: {}", stderr);
}

#[test]
fn test_subcommand_help_builds() {
    for sub in ["member-copy", "smpe-list", "smpe-global", "zcx-versions", "run-rexx"] {
        let (_, stderr, success) = run_cli(&[sub, "--help"]);
        assert!(success, "{sub} --help failed: {stderr}");
    }
}

#[test]
fn test_member_copy_requires_member() {
    let (_, stderr, success) = run_cli(&["member-copy", "A.PDS", "B.PDS"]);
    assert!(!success);
    assert!(stderr.contains("<MEMBERS>"), "Stderr: {}", stderr);
}
