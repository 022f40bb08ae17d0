//! CLI-level integration tests
//!
//! Everything here runs without a working ffmpeg installation: argument and
//! geometry validation fire before any collaborator is needed, and the
//! encoder probe degrades to the guaranteed fallback.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn keyclip() -> Command {
    Command::cargo_bin("keyclip").expect("binary builds")
}

#[test]
fn inverted_range_fails_with_no_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.mp4");
    std::fs::write(&input, b"not really a video").unwrap();
    let output = dir.path().join("out.mp4");

    keyclip()
        .args(["clip", "--start", "5", "--end", "2"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input-validation"));

    assert!(!output.exists(), "no output artifact may be created");
}

#[test]
fn missing_input_fails_validation() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.mp4");

    keyclip()
        .args(["clip", "--start", "0", "--end", "1"])
        .arg("--input")
        .arg(dir.path().join("nope.mp4"))
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("input-validation"));

    assert!(!output.exists());
}

#[test]
fn degenerate_corners_fail_before_processing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.mp4");
    std::fs::write(&input, b"bytes").unwrap();
    let output = dir.path().join("out.mp4");

    keyclip()
        .args(["clip", "--start", "0", "--end", "1"])
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args([
            "--top-left",
            "1,1",
            "--top-right",
            "1,1",
            "--bottom-left",
            "1,1",
            "--bottom-right",
            "1,1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Degenerate"));

    assert!(!output.exists());
}

#[test]
fn partial_corner_set_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.mp4");
    std::fs::write(&input, b"bytes").unwrap();

    keyclip()
        .args(["clip", "--start", "0", "--end", "1"])
        .arg("--input")
        .arg(&input)
        .args(["--top-left", "0,0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("all four corners"));
}

#[test]
fn bad_time_format_is_rejected() {
    keyclip()
        .args(["clip", "--input", "x.mp4", "--start", "abc", "--end", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad time"));
}

#[test]
fn crf_out_of_range_is_rejected_by_the_parser() {
    keyclip()
        .args([
            "clip", "--input", "x.mp4", "--start", "0", "--end", "1", "--crf", "99",
        ])
        .assert()
        .failure();
}

#[test]
fn encoders_always_reports_the_fallback() {
    keyclip()
        .arg("encoders")
        .assert()
        .success()
        .stdout(predicate::str::contains("mpeg4"))
        .stdout(predicate::str::contains("fallback"));
}

#[test]
fn encoders_json_ranks_fallback_last_and_once() {
    let output = keyclip().args(["encoders", "--json"]).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ranked = value["ranked"].as_array().unwrap();
    assert!(!ranked.is_empty(), "ranked list is never empty");
    assert_eq!(ranked.last().unwrap()["backend_id"], "mpeg4");

    let fallback_count = ranked
        .iter()
        .filter(|d| d["backend_id"] == "mpeg4")
        .count();
    assert_eq!(fallback_count, 1, "fallback appears exactly once");

    let entries = value["report"]["entries"].as_array().unwrap();
    assert_eq!(entries.last().unwrap()["outcome"], "fallback");
}

#[test]
fn inspect_of_missing_file_fails() {
    keyclip()
        .args(["inspect", "--input", "definitely-not-here.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input-validation"));
}
