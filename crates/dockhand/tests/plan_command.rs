use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_subcommands() {
    let mut cmd = Command::cargo_bin("dockhand").expect("binary built");

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn plan_prints_a_numbered_step_list() {
    let mut cmd = Command::cargo_bin("dockhand").expect("binary built");

    cmd.arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Planned installation steps for"))
        .stdout(predicate::str::contains("1. "))
        .stdout(predicate::str::contains("Verifying Docker installation"));
}

#[cfg(target_os = "linux")]
#[test]
fn plan_no_service_drops_the_service_step() {
    let mut cmd = Command::cargo_bin("dockhand").expect("binary built");

    cmd.args(["plan", "--no-service"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Enabling Docker service").not());
}
