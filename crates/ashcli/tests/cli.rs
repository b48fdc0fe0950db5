//! End-to-end tests for the ashcli binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn ashcli() -> Command {
    Command::cargo_bin("ashcli").unwrap()
}

#[test]
fn test_transposes_stdin_to_stdout() {
    ashcli()
        .args(["-n", "1"])
        .write_stdin("X:1\nK:C\nCDEFGABc\n")
        .assert()
        .success()
        .stdout("X:1\nK:Db\nDEFGABcd\n");
}

#[test]
fn test_zero_steps_echoes_input() {
    let input = "X:1\nK:C\n^F F F|F\n";
    ashcli()
        .args(["-n", "0"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(input);
}

#[test]
fn test_prefer_sharp_flag() {
    ashcli()
        .args(["-n", "1", "--mode", "chromatic", "--prefer", "sharp"])
        .write_stdin("X:1\nK:none\nC\n")
        .assert()
        .success()
        .stdout("X:1\nK:none\n^C\n");
}

#[test]
fn test_reports_unsupported_edo() {
    ashcli()
        .args(["-n", "1"])
        .write_stdin("%%MIDI temperamentequal 19\nK:C\nC\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported EDO 19"));
}

#[test]
fn test_max_delta_guard() {
    ashcli()
        .args(["-n", "2", "--max-delta", "1"])
        .write_stdin("X:1\nK:C\nC\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the configured range"));
}

#[test]
fn test_reads_and_writes_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.abc");
    let output = dir.path().join("out.abc");
    std::fs::write(&input, "X:1\nK:Em\nE|\n").unwrap();

    ashcli()
        .args(["-n", "-1", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "X:1\nK:Ebm\nE|\n"
    );
}
