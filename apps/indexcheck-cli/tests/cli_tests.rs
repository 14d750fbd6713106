//! Integration tests for the indexcheck binary
//!
//! Runs the compiled binary against mock clusters and checks its output and
//! exit codes.

use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

fn indexcheck() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_indexcheck"));
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("INDEXCHECK_LOG")
        .env_remove("INDEXCHECK_MAX_CONCURRENT_FETCHES")
        .env_remove("INDEXCHECK_HTTP_TIMEOUT_SECS");
    cmd
}

async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute command"))
        .await
        .unwrap()
}

/// Layout with a single `chi` group in a `local` replica on `port`.
fn write_layout(dir: &Path, port: u16) -> PathBuf {
    let path = dir.join("layout.yaml");
    std::fs::write(
        &path,
        format!(
            "common_acceptors:\n  - type: pattern\n    pattern: '^\\.tasks$'\ngroups:\n  - name: chi\n    port: {port}\nreplicas:\n  - name: local\n    cluster_name: \"search-{{group}}-{{replica}}\"\n    endpoint: \"http://127.0.0.1:{{port}}\"\n"
        ),
    )
    .unwrap();
    path
}

fn write_tenants(dir: &Path) -> PathBuf {
    let path = dir.join("tenants.json");
    std::fs::write(
        &path,
        json!([{
            "dbname": "enwiki",
            "clusters": {"local": {"group": "chi", "aliases": ["enwiki_content"]}}
        }])
        .to_string(),
    )
    .unwrap();
    path
}

async fn mount_cluster(server: &MockServer, indices: &[&str], aliases: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"cluster_name": "search-chi-local"})),
        )
        .mount(server)
        .await;
    let indices: Vec<_> = indices
        .iter()
        .map(|i| json!({"index": i, "status": "open"}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/_cat/indices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(indices))
        .mount(server)
        .await;
    let aliases: Vec<_> = aliases
        .iter()
        .map(|(a, i)| json!({"alias": a, "index": i}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/_cat/aliases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aliases))
        .mount(server)
        .await;
}

const HEALTHY_ALIASES: &[(&str, &str)] = &[
    ("mw_cirrus_metastore", "mw_cirrus_metastore_first"),
    ("enwiki_content", "enwiki_content_2"),
];

// =============================================================================
// Layout Command
// =============================================================================

#[test]
fn test_layout_prints_default_yaml() {
    let output = indexcheck().arg("layout").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("production-search-{replica}"));
    assert!(stdout.contains("cloudelastic"));
    assert!(stdout.contains("9643"));
}

#[test]
fn test_layout_lists_clusters() {
    let output = indexcheck()
        .args(["layout", "--clusters"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 9);
    assert!(lines[0].starts_with("eqiad/chi\tproduction-search-eqiad\thttps://search.svc.eqiad.wmnet:9243"));
}

#[test]
fn test_invalid_layout_exits_with_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let layout = dir.path().join("layout.yaml");
    std::fs::write(&layout, "groups: [not, a, layout").unwrap();

    let output = indexcheck()
        .args(["layout", "--layout"])
        .arg(&layout)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_json_logs_stay_on_stderr() {
    let output = indexcheck()
        .args(["layout", "--log-json", "--log-level", "debug"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("replicas:"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(events
        .iter()
        .any(|event| event["message"] == "Logging initialized"));
}

#[test]
fn test_invalid_env_setting_exits_with_config_error() {
    let output = indexcheck()
        .env("INDEXCHECK_HTTP_TIMEOUT_SECS", "soon")
        .arg("layout")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INDEXCHECK_HTTP_TIMEOUT_SECS"));
}

// =============================================================================
// Check Command
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_check_clean_cluster() {
    let server = MockServer::start().await;
    mount_cluster(
        &server,
        &["mw_cirrus_metastore_first", "enwiki_content_2", ".tasks"],
        HEALTHY_ALIASES,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = indexcheck();
    cmd.arg("check")
        .arg("--layout")
        .arg(write_layout(dir.path(), server.address().port()))
        .arg("--tenants-file")
        .arg(write_tenants(dir.path()))
        .arg("--fail-on-problems");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reports_problems() {
    let server = MockServer::start().await;
    mount_cluster(
        &server,
        &["mw_cirrus_metastore_first", "enwiki_content_2", "enwiki_content_1"],
        HEALTHY_ALIASES,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = indexcheck();
    cmd.arg("check")
        .arg("--layout")
        .arg(write_layout(dir.path(), server.address().port()))
        .arg("--tenants-file")
        .arg(write_tenants(dir.path()))
        .arg("--fail-on-problems");
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(6), "{output:?}");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[0]["cluster_name"], "search-chi-local");
    assert_eq!(report[0]["problems"][0]["index"], "enwiki_content_1");
    assert_eq!(report[0]["problems"][0]["kind"], "EXTRA");
    assert_eq!(
        report[0]["problems"][0]["reason"],
        "Duplicate of live index enwiki_content_2. Reindex in progress?"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_problems_without_flag_exit_zero() {
    let server = MockServer::start().await;
    mount_cluster(&server, &["mw_cirrus_metastore_first"], HEALTHY_ALIASES).await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = indexcheck();
    cmd.arg("check")
        .arg("--layout")
        .arg(write_layout(dir.path(), server.address().port()))
        .arg("--tenants-file")
        .arg(write_tenants(dir.path()))
        .args(["--format", "text"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(0), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("search-chi-local"));
    assert!(stdout.contains("MISSING  enwiki_content_2: Expected index was missing"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_unreachable_fleet() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = indexcheck();
    cmd.arg("check")
        .arg("--layout")
        .arg(write_layout(dir.path(), 9))
        .arg("--tenants-file")
        .arg(write_tenants(dir.path()))
        .args(["--timeout-secs", "2"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("search-chi-local"));
    assert!(stderr.contains("unreachable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_reuses_run_cache() {
    let server = MockServer::start().await;
    mount_cluster(
        &server,
        &["mw_cirrus_metastore_first", "enwiki_content_2"],
        HEALTHY_ALIASES,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let layout = write_layout(dir.path(), server.address().port());
    let tenants = write_tenants(dir.path());
    let cache = dir.path().join("run-cache.json");

    let mut first = indexcheck();
    first
        .arg("check")
        .arg("--layout")
        .arg(&layout)
        .arg("--tenants-file")
        .arg(&tenants)
        .arg("--run-cache-path")
        .arg(&cache);
    let output = run(first).await;
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    assert!(cache.exists());

    // The tenants file is gone; only the cache can supply tenant state.
    std::fs::remove_file(&tenants).unwrap();

    let mut second = indexcheck();
    second
        .arg("check")
        .arg("--layout")
        .arg(&layout)
        .arg("--tenants-file")
        .arg(&tenants)
        .arg("--run-cache-path")
        .arg(&cache)
        .arg("--fail-on-problems");
    let output = run(second).await;
    assert_eq!(output.status.code(), Some(0), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_missing_tenants_file() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = indexcheck();
    cmd.arg("check")
        .arg("--layout")
        .arg(write_layout(dir.path(), 9))
        .arg("--tenants-file")
        .arg(dir.path().join("absent.json"));
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(1), "{output:?}");
}
