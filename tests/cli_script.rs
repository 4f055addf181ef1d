mod common;

use assert_cmd::Command;
use predicates::str::contains;

#[test]
fn script_mode_adds_filters_and_exports() {
    let base = common::offline_base();
    let export = base.join("export.json");
    let input = format!(
        "add \"Simplicity is the soul of efficiency\" Craft\nfilter Craft\nlist\nexport {}\nexit\n",
        export.display()
    );

    let mut cmd = Command::cargo_bin("quotebook_cli").unwrap();
    cmd.env("QUOTEBOOK_CLI_SCRIPT", "1")
        .env("QUOTEBOOK_HOME", &base)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("New quote added!"))
        .stdout(contains("Simplicity is the soul of efficiency"));

    let json = std::fs::read_to_string(&export).unwrap();
    assert!(json.contains("\"Craft\""));
    assert!(json.contains("\"User\""));
}

#[test]
fn script_mode_survives_unknown_commands_and_failed_sync() {
    let base = common::offline_base();

    let mut cmd = Command::cargo_bin("quotebook_cli").unwrap();
    cmd.env("QUOTEBOOK_CLI_SCRIPT", "1")
        .env("QUOTEBOOK_HOME", &base)
        .write_stdin("lsit\nsync\ncategories\nexit\n")
        .assert()
        .success()
        .stdout(contains("Did you mean `list`?"))
        .stdout(contains("Sync failed"))
        .stdout(contains("Motivation"));
}
