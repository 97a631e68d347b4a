//! E2E tests driving the `ballot` binary: init, catalog, votes, results.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn ballot_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ballot"));
    cmd.current_dir(dir);
    cmd.env("BALLOT_LOG", "error");
    cmd.env_remove("BALLOT_DB");
    cmd.env_remove("BALLOT_BIND");
    cmd
}

fn json_output(dir: &Path, args: &[&str]) -> Value {
    let output = ballot_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn init_with_items(dir: &Path, ids: &[&str]) {
    ballot_cmd(dir).arg("init").assert().success();
    for id in ids {
        ballot_cmd(dir).args(["add", id]).assert().success();
    }
}

#[test]
fn init_creates_config_and_database() {
    let dir = TempDir::new().expect("tempdir");

    ballot_cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized ballot"));

    assert!(dir.path().join("ballot.toml").is_file());
    assert!(dir.path().join("ballot.db").is_file());

    let config = fs::read_to_string(dir.path().join("ballot.toml")).expect("config");
    assert!(config.contains("[server]"));
    assert!(config.contains("bind = \"127.0.0.1:5000\""));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().expect("tempdir");
    ballot_cmd(dir.path()).arg("init").assert().success();

    ballot_cmd(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    ballot_cmd(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn votes_are_tallied_per_item() {
    let dir = TempDir::new().expect("tempdir");
    init_with_items(dir.path(), &["1", "2"]);

    for _ in 0..3 {
        ballot_cmd(dir.path()).args(["vote", "1"]).assert().success();
    }
    let receipt = json_output(dir.path(), &["vote", "2"]);
    assert_eq!(receipt, json!({"item_id": 2, "votes": 1}));

    let results = json_output(dir.path(), &["results"]);
    assert_eq!(
        results,
        json!([
            {"image_id": 1, "votes": 3},
            {"image_id": 2, "votes": 1}
        ])
    );
}

#[test]
fn unknown_vote_fails_with_code_and_changes_nothing() {
    let dir = TempDir::new().expect("tempdir");
    init_with_items(dir.path(), &["1", "2"]);

    ballot_cmd(dir.path())
        .args(["vote", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));

    let output = ballot_cmd(dir.path())
        .args(["vote", "3", "--json"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).expect("json error");
    assert_eq!(err["error"]["error_code"], "E2001");

    let results = json_output(dir.path(), &["results"]);
    assert_eq!(
        results,
        json!([
            {"image_id": 1, "votes": 0},
            {"image_id": 2, "votes": 0}
        ])
    );
}

#[test]
fn results_top_orders_by_votes() {
    let dir = TempDir::new().expect("tempdir");
    init_with_items(dir.path(), &["1", "2", "3"]);
    for id in ["3", "3", "2"] {
        ballot_cmd(dir.path()).args(["vote", id]).assert().success();
    }

    let top = json_output(dir.path(), &["results", "--top", "2"]);
    assert_eq!(
        top,
        json!([
            {"image_id": 3, "votes": 2},
            {"image_id": 2, "votes": 1}
        ])
    );

    ballot_cmd(dir.path())
        .arg("results")
        .assert()
        .success()
        .stdout(predicate::str::contains("total"));
}

#[test]
fn add_keeps_votes_and_updates_metadata() {
    let dir = TempDir::new().expect("tempdir");
    init_with_items(dir.path(), &["7"]);
    ballot_cmd(dir.path()).args(["vote", "7"]).assert().success();

    let report = json_output(dir.path(), &["add", "7", "--name", "Lighthouse"]);
    assert_eq!(report["created"], false);
    assert_eq!(report["name"], "Lighthouse");

    let items = json_output(dir.path(), &["list"]);
    assert_eq!(items, json!([{"image_id": 7, "name": "Lighthouse"}]));

    let results = json_output(dir.path(), &["results"]);
    assert_eq!(results, json!([{"image_id": 7, "votes": 1}]));
}

#[test]
fn log_shows_newest_votes_first() {
    let dir = TempDir::new().expect("tempdir");
    init_with_items(dir.path(), &["1", "2"]);
    for id in ["1", "2", "2"] {
        ballot_cmd(dir.path()).args(["vote", id]).assert().success();
    }

    let events = json_output(dir.path(), &["log", "--limit", "2"]);
    let events = events.as_array().expect("array");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["item_id"], 2);
    assert!(events[0]["event_id"].as_i64() > events[1]["event_id"].as_i64());
}

#[test]
fn rebuild_reports_consistent_counters() {
    let dir = TempDir::new().expect("tempdir");
    init_with_items(dir.path(), &["1"]);
    ballot_cmd(dir.path()).args(["vote", "1"]).assert().success();

    let report = json_output(dir.path(), &["rebuild"]);
    assert_eq!(report["items"], 1);
    assert_eq!(report["events"], 1);
    assert_eq!(report["corrected"], 0);
}

#[test]
fn db_flag_and_env_select_the_database() {
    let dir = TempDir::new().expect("tempdir");
    let db = dir.path().join("data/votes.db");
    let db_arg = db.to_str().expect("utf8 path");

    ballot_cmd(dir.path())
        .args(["--db", db_arg, "add", "5"])
        .assert()
        .success();
    assert!(db.is_file());
    assert!(!dir.path().join("ballot.db").exists());

    let items = {
        let output = ballot_cmd(dir.path())
            .env("BALLOT_DB", db_arg)
            .args(["list", "--json"])
            .output()
            .expect("run");
        assert!(output.status.success());
        serde_json::from_slice::<Value>(&output.stdout).expect("json")
    };
    assert_eq!(items, json!([{"image_id": 5}]));
}

#[test]
fn config_file_database_is_used() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("ballot.toml"),
        "[store]\ndatabase = \"configured.db\"\n",
    )
    .expect("write config");

    ballot_cmd(dir.path()).args(["add", "9"]).assert().success();
    assert!(dir.path().join("configured.db").is_file());
}

#[test]
fn completions_mention_the_binary() {
    let dir = TempDir::new().expect("tempdir");
    ballot_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ballot"));
}
