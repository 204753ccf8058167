//! End-to-end tests for the scopeload binary.

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scopeload() -> Command {
    let mut cmd = Command::cargo_bin("scopeload").expect("binary built");
    cmd.env_remove("SCOPELOAD_BASE_URL")
        .env_remove("SCOPELOAD_TOKEN")
        .env_remove("SCOPELOAD_CACHE_SUFFIX")
        .env("RUST_LOG", "off");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_reports_each_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a.css"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.css"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let base_url = format!("{}/", mock_server.uri());
    tokio::task::spawn_blocking(move || {
        scopeload()
            .args(["fetch", "--base-url", &base_url, "a.css", "b.css"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("ok   a.css"))
            .stdout(predicate::str::contains("fail b.css"));
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_json_all_loaded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/theme.css"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let base_url = format!("{}/", mock_server.uri());
    let output = tokio::task::spawn_blocking(move || {
        scopeload()
            .args([
                "fetch",
                "--json",
                "--cache-suffix",
                "v=1",
                "--base-url",
                &base_url,
                "theme.css",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports[0]["scope"], "document");
    assert_eq!(reports[0]["results"][0]["url"], "theme.css?v=1");
    assert_eq!(reports[0]["results"][0]["loaded"], true);
}

#[test]
fn test_fetch_invalid_base_url_is_config_error() {
    scopeload()
        .args(["fetch", "--base-url", "not a url", "a.css"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid url"));
}

#[test]
fn test_fetch_zero_request_timeout_is_config_error() {
    scopeload()
        .env("SCOPELOAD_HTTP_TIMEOUT", "0")
        .args(["fetch", "--base-url", "http://127.0.0.1:9/", "a.css"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_config_prints_defaults() {
    scopeload()
        .env_remove("SCOPELOAD_MAX_LOAD_TIME_MS")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_load_time_ms\": 5000"));
}
