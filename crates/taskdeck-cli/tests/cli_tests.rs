use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn taskdeck(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("taskdeck").unwrap();
    cmd.current_dir(temp.path())
        .env("TASKDECK_DATABASE_PATH", temp.path().join("deck.db"))
        .env("TASKDECK_TIMEZONE", "UTC");
    cmd
}

#[test]
fn add_and_list_roundtrip() {
    let temp = TempDir::new().unwrap();

    taskdeck(&temp)
        .args(["add", "Fix login", "--tag", "auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fix login"));

    taskdeck(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fix login"));
}

#[test]
fn weekly_without_days_is_rejected() {
    let temp = TempDir::new().unwrap();

    taskdeck(&temp)
        .args([
            "add",
            "Weekly review",
            "--every",
            "weekly",
            "--deadline",
            "2025-08-18 09:00",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("weekday"));
}

#[test]
fn recurring_add_appears_in_both_views() {
    let temp = TempDir::new().unwrap();

    taskdeck(&temp)
        .args([
            "add",
            "Daily standup",
            "--every",
            "daily",
            "--deadline",
            "2025-08-18 09:00",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("template"));

    // The template shows on the templates view..
    taskdeck(&temp)
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily standup"));

    // ..and its first instance on the board.
    taskdeck(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily standup"));
}

#[test]
fn sweep_once_reports_a_summary() {
    let temp = TempDir::new().unwrap();

    taskdeck(&temp)
        .args(["sweep", "--once"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Swept 0 templates"));
}
