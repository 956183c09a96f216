//! Black-box tests for the `relay` binary.

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;

fn relay() -> Command {
    let mut cmd = Command::cargo_bin("relay").expect("binary");
    // Isolate from the host environment's job configuration.
    cmd.env_remove("REPOS")
        .env_remove("FROM_REPO")
        .env_remove("TO_REPO")
        .env_remove("PORT")
        .env_remove("SYNC_INTERVAL_SECS")
        .env_remove("RELAY_DATA_DIR")
        .env_remove("RELAY_METADATA_URL");
    cmd
}

#[test]
fn help_lists_subcommands() {
    relay()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn start_without_jobs_is_a_fatal_configuration_error() {
    relay()
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("REPOS environment variable must be set"));
}

#[test]
fn start_rejects_malformed_repos_json() {
    relay()
        .arg("start")
        .env("REPOS", "not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse REPOS"));
}

#[test]
fn start_rejects_duplicate_job_ids() {
    relay()
        .arg("start")
        .env(
            "REPOS",
            r#"[{"ID":"a","From":"u1","To":"u2"},{"ID":"a","From":"u3","To":"u4"}]"#,
        )
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate job ID"));
}

#[test]
fn start_fails_when_metadata_indirection_cannot_resolve() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing-key");
        then.status(404).body("not found");
    });

    relay()
        .arg("start")
        .env("REPOS", "metadata:missing-key")
        .env("RELAY_METADATA_URL", server.base_url())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not resolve metadata value"));
}

#[test]
fn status_prints_a_healthy_report() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/status");
        then.status(200)
            .header("Content-Type", "text/plain")
            .body("---- repo a ----\nOK now?    true\n");
    });

    relay()
        .arg("status")
        .arg("--url")
        .arg(format!("{}/status", server.base_url()))
        .assert()
        .success()
        .stdout(predicate::str::contains("---- repo a ----"));
}

#[test]
fn status_exits_nonzero_when_unhealthy() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/status");
        then.status(503)
            .header("Content-Type", "text/plain")
            .body("Repo \"a\" possibly not fresh\n");
    });

    relay()
        .arg("status")
        .arg("--url")
        .arg(format!("{}/status", server.base_url()))
        .assert()
        .failure()
        .stdout(predicate::str::contains("possibly not fresh"))
        .stderr(predicate::str::contains("HTTP 503"));
}

#[test]
fn status_fails_cleanly_when_daemon_is_down() {
    // Grab an ephemeral port, then close it again so nothing listens.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    relay()
        .arg("status")
        .arg("--port")
        .arg(port.to_string())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not reach"));
}
