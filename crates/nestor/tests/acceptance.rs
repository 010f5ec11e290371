// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, ends_with};

fn sut(mock_server: &MockServer) -> Command {
    let mut command = Command::cargo_bin("nestor").expect("Should be able to create a command");
    command.env("JENKINS_URL", mock_server.base_url()).arg("--no-colors");
    command
}

#[test]
fn should_display_help() {
    let mock_server = MockServer::start();

    let execution = sut(&mock_server).arg("--help").assert();

    execution.success().stdout(contains("dashboard")).stdout(contains("status"));
}

#[test]
fn should_display_jenkins_version() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("HEAD").path("/");
        then.status(200).header("x-jenkins", "2.462.3");
    });

    let execution = sut(&mock_server).arg("ver").assert();

    execution.success().stdout(contains("Jenkins ver. 2.462.3"));
}

#[test]
fn should_fail_when_server_is_not_jenkins() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("HEAD").path("/");
        then.status(200);
    });

    let execution = sut(&mock_server).arg("ver").assert();

    execution.failure().code(1).stderr(contains("Jenkins"));
}

#[test]
fn should_list_queued_jobs() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("GET").path("/queue/api/json");
        then.status(200)
            .body(r#"{ "items": [ { "task": { "name": "nestor" } }, { "task": { "name": "castor" } } ] }"#);
    });

    let execution = sut(&mock_server).arg("queue").assert();

    execution.success().stdout(contains("- nestor")).stdout(contains("- castor"));
}

#[test]
fn should_report_empty_dashboard() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("GET").path("/api/json");
        then.status(200).body(r#"{ "jobs": [] }"#);
    });

    let execution = sut(&mock_server).arg("dashboard").assert();

    execution.success().stdout(contains("Jobless Jenkins"));
}

#[test]
fn should_display_job_health() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("GET").path("/job/nestor/api/json");
        then.status(200).body(
            r#"{ "name": "nestor", "color": "red", "healthReport": [ { "description": "Build stability: all recent builds failed.", "score": 0 } ] }"#,
        );
    });

    let execution = sut(&mock_server).args(["job", "nestor"]).assert();

    execution
        .success()
        .stdout(contains("nestor | FAIL"))
        .stdout(contains(" - Build stability: all recent builds failed."));
}

#[test]
fn should_fail_for_missing_job() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("GET").path("/job/ghost/api/json");
        then.status(404);
    });

    let execution = sut(&mock_server).args(["job", "ghost"]).assert();

    execution.failure().code(1).stderr(contains("Job ghost does not exist"));
}

#[test]
fn should_display_build_status_with_variants() {
    let mock_server = MockServer::start();
    let base_url = mock_server.base_url();

    let parent = format!(
        r#"{{
            "number": 12,
            "url": "{base_url}/job/nestor/12/",
            "building": false,
            "result": "UNSTABLE",
            "duration": 3723000,
            "timestamp": 1760000000000,
            "actions": [ {{ "parameters": [ {{ "name": "branch", "value": "main" }} ] }} ],
            "uuid": "c0ffee",
            "runs": [
                {{ "number": 12, "url": "{base_url}/job/nestor/os=linux/12/" }},
                {{ "number": 12, "url": "{base_url}/job/nestor/os=macos/12/" }}
            ]
        }}"#
    );

    mock_server.mock(|when, then| {
        when.method("GET").path("/job/nestor/12/api/json");
        then.status(200).body(parent);
    });

    let linux = format!(r#"{{ "number": 12, "url": "{base_url}/job/nestor/os=linux/12/", "result": "SUCCESS" }}"#);

    mock_server.mock(|when, then| {
        when.method("GET").path("/job/nestor/os=linux/12/api/json");
        then.status(200).body(linux);
    });

    mock_server.mock(|when, then| {
        when.method("GET").path("/job/nestor/os=macos/12/api/json");
        then.status(404);
    });

    let execution = sut(&mock_server).args(["status", "nestor", "12"]).assert();

    execution
        .success()
        .stdout(contains("[#12, UNSTABLE] nestor branch=\"main\""))
        .stdout(contains("|| Duration: 1h2m3s"))
        .stdout(contains("|| UUID: c0ffee"))
        .stdout(contains("||--- [SUCCESS] nestor#12 os=linux"))
        .stdout(contains("||--- [QUEUED] nestor#12 os=macos"));
}

#[test]
fn should_stop_last_build() {
    let mock_server = MockServer::start();

    let stop = mock_server.mock(|when, then| {
        when.method("GET").path("/job/nestor/lastBuild/stop");
        then.status(200);
    });

    let execution = sut(&mock_server).args(["stop", "nestor"]).assert();

    execution.success().stdout(contains("Job nestor was stopped successfully"));
    stop.assert();
}

#[test]
fn should_stream_console_of_last_build() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("GET")
            .path("/job/nestor/lastBuild/logText/progressiveText")
            .query_param("start", "0");
        then.status(200)
            .header("x-more-data", "false")
            .header("x-text-size", "24")
            .body("Finished: SUCCESS\n");
    });

    let execution = sut(&mock_server).args(["console", "nestor"]).assert();

    execution
        .success()
        .stdout(contains("Finished: SUCCESS"))
        .stdout(ends_with("\n\n").not());
}

#[test]
fn should_terminate_console_output_without_final_newline() {
    let mock_server = MockServer::start();

    mock_server.mock(|when, then| {
        when.method("GET")
            .path("/job/nestor/lastBuild/logText/progressiveText")
            .query_param("start", "0");
        then.status(200)
            .header("x-more-data", "false")
            .header("x-text-size", "17")
            .body("Finished: SUCCESS");
    });

    let execution = sut(&mock_server).args(["console", "nestor"]).assert();

    execution.success().stdout(ends_with("Finished: SUCCESS\n"));
}
