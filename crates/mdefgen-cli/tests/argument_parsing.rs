//! Focused CLI argument parsing tests.
//!
//! Tests that verify command-line argument parsing works correctly without
//! touching version control or the suite runner.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn version_command_succeeds() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdefgen"));
}

#[test]
fn version_flag_shows_version() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdefgen"));
}

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("metadata-driven"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("results"));
}

#[test]
fn global_flags_are_listed_on_subcommands() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .args(["generate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--seed"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--project"));
}

#[test]
fn diff_requires_two_files() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .args(["diff", "only-one.mdef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn samples_requires_metadata_file() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .arg("samples")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn seed_must_be_numeric() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .args(["--seed", "abc", "generate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}

#[test]
fn config_requires_subcommand() {
    Command::cargo_bin("mdefgen")
        .unwrap()
        .arg("config")
        .assert()
        .failure();
}
