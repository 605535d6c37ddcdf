use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("sitectl")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("toggle"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--base-url"));
}

#[test]
fn test_set_help_lists_states() {
    cargo_bin_cmd!("sitectl")
        .args(["set", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("live"))
        .stdout(predicate::str::contains("maintenance"));
}

#[test]
fn test_set_rejects_unknown_state() {
    cargo_bin_cmd!("sitectl")
        .args(["set", "offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("sitectl")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
