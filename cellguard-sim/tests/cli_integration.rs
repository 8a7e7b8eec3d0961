//! Integration tests for the cellguard-sim CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_cellguard-sim"))
}

fn create_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run cellguard-sim")
}

#[test]
fn default_run_prints_report() {
    let output = run(&[]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("=== SIMULATION COMPLETE ==="));
    assert!(stdout.contains("Simulation ended at cycle 970"));
    assert!(stdout.contains("state_o = 0"));
    assert!(stdout.contains("fault_count_o = 3"));
    assert!(stdout.contains("warning_count_o = 1"));
    assert!(stdout.contains("last_fault_cycle_o = 599"));
    assert!(stdout.contains("State decoded: NORMAL"));
    assert!(stdout.contains("Fault code decoded: NONE"));
}

#[test]
fn run_writes_trace() {
    let temp_dir = tempfile::tempdir().unwrap();
    let trace = temp_dir.path().join("trace.csv");

    let output = run(&["run", "--trace", trace.to_str().unwrap()]);
    assert!(output.status.success());

    let csv = fs::read_to_string(&trace).unwrap();
    // Header plus one row per cycle
    assert_eq!(csv.lines().count(), 971);
}

#[test]
fn run_with_toml_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_temp_file(
        temp_dir.path(),
        "pack.toml",
        "[shutdown]\ncritical_channel = \"current\"\n",
    );

    let output = run(&["run", "-c", config.to_str().unwrap()]);
    assert!(output.status.success());

    // Manual reset still clears the shutdown before the end of the run
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("state_o = 0"));
    assert!(stdout.contains("fault_count_o = 3"));
}

#[test]
fn image_then_run_from_image() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_temp_file(
        temp_dir.path(),
        "pack.toml",
        "counter_reset = \"clear\"\n",
    );
    let image = temp_dir.path().join("pack.bin");

    let output = run(&[
        "image",
        image.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(image.exists());

    let output = run(&["run", "--config", image.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("fault_count_o = 0"));
}

#[test]
fn invalid_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = create_temp_file(
        temp_dir.path(),
        "bad.toml",
        "[voltage.debounce]\nwarning_cycles = 0\nfault_cycles = 10\n",
    );

    let output = run(&["run", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("invalid"));
}

#[test]
fn missing_config_file_fails() {
    let output = run(&["run", "--config", "/nonexistent/pack.toml"]);
    assert!(!output.status.success());
}

#[test]
fn unknown_option_is_usage_error() {
    let output = run(&["--frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Usage:"));
}
