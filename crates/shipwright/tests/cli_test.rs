mod common;

use assert_cmd::Command;
use common::{TWO_ENVIRONMENTS, TestProject};
use predicates::prelude::*;

fn ship() -> Command {
    let mut cmd = Command::cargo_bin("ship").unwrap();
    cmd.env_remove("SHIP_CONFIG_ROOT").env_remove("SHIP_ENV");
    cmd
}

#[test]
fn test_cli_help() {
    ship()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provision and deploy"))
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("restore"));
}

#[test]
fn test_cli_version() {
    ship()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shipwright"));
}

#[test]
fn test_envs_lists_registered_environments() {
    let project = TestProject::new();
    project.write_ship_kdl(TWO_ENVIRONMENTS);

    ship()
        .env("SHIP_CONFIG_ROOT", project.path())
        .arg("envs")
        .assert()
        .success()
        .stdout(predicate::str::contains("beta"))
        .stdout(predicate::str::contains("production"))
        .stdout(predicate::str::contains("beta.example.com"));
}

#[test]
fn test_validate_reports_environment_count() {
    let project = TestProject::new();
    project.write_ship_kdl(TWO_ENVIRONMENTS);

    ship()
        .env("SHIP_CONFIG_ROOT", project.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 environment(s)"));
}

#[test]
fn test_duplicate_environment_fails_validation() {
    let project = TestProject::new();
    project.write_ship_kdl(
        r#"
environment "beta" {
    host "a"
    workon "/opt/envs"
    project "demo"
    settings "settings"
    repository "repo"
}
environment "beta" {
    host "b"
    workon "/opt/envs"
    project "demo"
    settings "settings"
    repository "repo"
}
"#,
    );

    ship()
        .env("SHIP_CONFIG_ROOT", project.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"));
}

#[test]
fn test_unknown_environment_fails() {
    let project = TestProject::new();
    project.write_ship_kdl(TWO_ENVIRONMENTS);

    ship()
        .env("SHIP_CONFIG_ROOT", project.path())
        .args(["update", "nosuch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown environment"));
}

#[test]
fn test_missing_config_fails_with_hint() {
    let project = TestProject::new();

    ship()
        .current_dir(project.path())
        .arg("envs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ship.kdl"));
}

#[test]
fn test_restore_rejects_non_archive_argument() {
    let project = TestProject::new();
    project.write_ship_kdl(TWO_ENVIRONMENTS);

    // Fails before anything touches the network: the argument is not a
    // .tar.gz archive.
    ship()
        .env("SHIP_CONFIG_ROOT", project.path())
        .args(["restore", "beta", "notanarchive.zip", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid backup archive"));
}

#[test]
fn test_update_help_shows_env_placeholder() {
    ship()
        .args(["update", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ENVIRONMENT]"));
}
