//! Fleet Run Tests
//!
//! Covers state collection with failing clusters, tenant state sources and
//! the full check pipeline against mock clusters.

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use indexcheck_core::fleet::{FleetLayout, GroupLayout, ReplicaLayout};
use indexcheck_core::model::{ClusterConfig, ClusterKey, ObservedState, ProblemKind};
use indexcheck_fleet::{
    collect_states, run_fleet_check, ClusterStateFetcher, CommandTenantSource, FileTenantSource,
    FleetError, FleetResult, HttpStateFetcher, RunOptions, TenantStateSource,
};

// =============================================================================
// Stub Fetcher
// =============================================================================

/// Answers with an empty state, except for clusters of the failing group.
struct StubFetcher {
    failing_group: &'static str,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubFetcher {
    fn new(failing_group: &'static str) -> Self {
        Self {
            failing_group,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ClusterStateFetcher for StubFetcher {
    async fn fetch(&self, cluster: &ClusterConfig) -> FleetResult<ObservedState> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if cluster.key.group == self.failing_group {
            return Err(FleetError::ClusterUnreachable {
                cluster: cluster.name.clone(),
                message: "connection refused".to_string(),
            });
        }
        Ok(ObservedState::new(cluster.name.clone(), cluster.key.clone()))
    }
}

fn default_clusters() -> Vec<ClusterConfig> {
    FleetLayout::default()
        .build_clusters(&Default::default())
        .unwrap()
}

// =============================================================================
// Collection Tests
// =============================================================================

#[tokio::test]
async fn test_failures_are_isolated() {
    let clusters = default_clusters();
    let collection = collect_states(Arc::new(StubFetcher::new("omega")), &clusters, 4).await;

    assert_eq!(collection.states.len(), 6);
    assert_eq!(collection.failures.len(), 3);
    assert!(!collection.is_complete());

    let failed: Vec<&str> = collection
        .failures
        .iter()
        .map(|f| f.cluster_name.as_str())
        .collect();
    assert_eq!(
        failed,
        vec![
            "production-search-omega-eqiad",
            "production-search-omega-codfw",
            "cloudelastic-omega-eqiad",
        ]
    );
    assert_eq!(collection.failures[0].code, "CLUSTER_UNREACHABLE");
    assert_eq!(collection.failures[0].key, ClusterKey::new("eqiad", "omega"));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let clusters = default_clusters();
    let fetcher = Arc::new(StubFetcher::new("none"));
    let collection = collect_states(Arc::clone(&fetcher), &clusters, 2).await;

    assert!(collection.is_complete());
    assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_trait_object_fetcher() {
    let fetcher: Arc<dyn ClusterStateFetcher> = Arc::new(StubFetcher::new("psi"));
    let collection = collect_states(fetcher, &default_clusters(), 8).await;
    assert_eq!(collection.failures.len(), 3);
}

/// Omega clusters answer with the chi key of their replica.
struct WrongKeyFetcher;

#[async_trait]
impl ClusterStateFetcher for WrongKeyFetcher {
    async fn fetch(&self, cluster: &ClusterConfig) -> FleetResult<ObservedState> {
        if cluster.key.group == "omega" {
            let chi = ClusterKey::new(cluster.key.replica.clone(), "chi");
            return Ok(ObservedState::new(cluster.name.clone(), chi).with_index("omega_idx"));
        }
        Ok(ObservedState::new(cluster.name.clone(), cluster.key.clone()).with_index("own_idx"))
    }
}

#[tokio::test]
async fn test_state_under_wrong_key_is_rejected() {
    let clusters = default_clusters();
    let collection = collect_states(Arc::new(WrongKeyFetcher), &clusters, 1).await;

    assert_eq!(collection.states.len(), 6);
    let chi = collection
        .states
        .get(&ClusterKey::new("eqiad", "chi"))
        .unwrap();
    assert_eq!(chi.cluster_name, "production-search-eqiad");
    assert!(chi.indices.contains("own_idx"));
    assert!(!chi.indices.contains("omega_idx"));

    assert_eq!(collection.failures.len(), 3);
    let failure = &collection.failures[0];
    assert_eq!(failure.cluster_name, "production-search-omega-eqiad");
    assert_eq!(failure.key, ClusterKey::new("eqiad", "omega"));
    assert_eq!(failure.code, "CLUSTER_IDENTITY_MISMATCH");
    assert!(failure.error.contains("eqiad/omega"));
    assert!(failure.error.contains("eqiad/chi"));
}

/// Panics on psi clusters.
struct PanickingFetcher;

#[async_trait]
impl ClusterStateFetcher for PanickingFetcher {
    async fn fetch(&self, cluster: &ClusterConfig) -> FleetResult<ObservedState> {
        if cluster.key.group == "psi" {
            panic!("fetcher bug");
        }
        Ok(ObservedState::new(cluster.name.clone(), cluster.key.clone()))
    }
}

#[tokio::test]
async fn test_panicked_fetch_is_recorded_as_internal_failure() {
    let clusters = default_clusters();
    let collection = collect_states(Arc::new(PanickingFetcher), &clusters, 4).await;

    assert_eq!(collection.states.len(), 6);
    assert_eq!(collection.failures.len(), 3);
    for failure in &collection.failures {
        assert_eq!(failure.key.group, "psi");
        assert_eq!(failure.code, "INTERNAL");
        assert_eq!(failure.error, "fetch task did not complete");
    }
    assert_eq!(
        collection.failures[0].cluster_name,
        "production-search-psi-eqiad"
    );
}

// =============================================================================
// Tenant Source Tests
// =============================================================================

#[tokio::test]
async fn test_file_tenant_source() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        json!([
            {"dbname": "enwiki", "clusters": {
                "eqiad": {"group": "chi", "aliases": ["enwiki_content"]},
                "codfw": {"group": "chi", "aliases": ["enwiki_content"]}
            }},
            {"dbname": "testwiki", "clusters": {}}
        ])
    )
    .unwrap();

    let tenants = FileTenantSource::new(file.path()).load().await.unwrap();
    assert_eq!(tenants.len(), 2);
    assert_eq!(tenants[0].tenant, "enwiki");
    assert_eq!(tenants[0].clusters.len(), 2);
    assert!(tenants[1].clusters.is_empty());
}

#[tokio::test]
async fn test_file_tenant_source_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileTenantSource::new(dir.path().join("absent.json"))
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::Io(_)));
}

#[tokio::test]
async fn test_command_tenant_source() {
    let list = vec![
        "sh".to_string(),
        "-c".to_string(),
        "printf 'enwiki\\ndewiki\\n\\n'".to_string(),
    ];
    let per_tenant = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"printf '{"dbname": "%s", "clusters": {"eqiad": {"group": "chi", "aliases": ["%s_content"]}}}' "$1" "$1""#
            .to_string(),
        "sh".to_string(),
        "{tenant}".to_string(),
    ];

    let tenants = CommandTenantSource::new(list, per_tenant)
        .with_max_concurrent(1)
        .load()
        .await
        .unwrap();

    let names: Vec<&str> = tenants.iter().map(|t| t.tenant.as_str()).collect();
    assert_eq!(names, vec!["enwiki", "dewiki"]);
    assert_eq!(tenants[1].clusters[0].aliases, vec!["dewiki_content"]);
}

#[tokio::test]
async fn test_command_tenant_source_failing_command() {
    let list = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
    let err = CommandTenantSource::new(list, vec![])
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::CommandFailed { .. }));
}

#[tokio::test]
async fn test_command_tenant_source_invalid_document() {
    let list = vec!["echo".to_string(), "enwiki".to_string()];
    let per_tenant = vec!["echo".to_string(), "not json".to_string()];
    let err = CommandTenantSource::new(list, per_tenant)
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, FleetError::InvalidTenantState { ref tenant, .. } if tenant == "enwiki"));
}

// =============================================================================
// Full Run Tests
// =============================================================================

/// Layout with one replica whose groups each point at a mock server.
fn local_layout(servers: &[(&str, &MockServer)]) -> FleetLayout {
    FleetLayout {
        common_acceptors: vec![],
        groups: servers
            .iter()
            .map(|(name, server)| GroupLayout {
                name: (*name).to_string(),
                port: server.address().port(),
                acceptors: vec![],
            })
            .collect(),
        replicas: vec![ReplicaLayout {
            name: "local".to_string(),
            cluster_name: "{group}-{replica}".to_string(),
            endpoint: "http://127.0.0.1:{port}".to_string(),
            cluster_name_overrides: BTreeMap::new(),
            group_acceptors: true,
        }],
    }
}

async fn mount(server: &MockServer, name: &str, indices: &[&str], aliases: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cluster_name": name})))
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

#[tokio::test]
async fn test_full_run_reports_problems_and_failures() {
    let chi = MockServer::start().await;
    let omega = MockServer::start().await;
    mount(
        &chi,
        "chi-local",
        &["mw_cirrus_metastore_first", "enwiki_content_2", "enwiki_content_1"],
        &[
            ("mw_cirrus_metastore", "mw_cirrus_metastore_first"),
            ("enwiki_content", "enwiki_content_2"),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&omega)
        .await;

    let tenants = vec![indexcheck_fleet::parse_tenant_document(
        "enwiki",
        r#"{"dbname": "enwiki", "clusters": {"local": {"group": "chi", "aliases": ["enwiki_content"]}}}"#,
    )
    .unwrap()];

    let fetcher = Arc::new(HttpStateFetcher::new(Duration::from_secs(5)).unwrap());
    let run = run_fleet_check(
        &local_layout(&[("chi", &chi), ("omega", &omega)]),
        &tenants,
        fetcher,
        RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(run.cluster_count, 2);
    assert!(run.is_partial());
    assert!(!run.all_failed());
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].cluster_name, "omega-local");

    assert_eq!(run.report.clusters.len(), 1);
    let problems = &run.report.clusters[0].problems;
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].index, "enwiki_content_1");
    assert_eq!(problems[0].kind, ProblemKind::Extra);
    assert_eq!(
        problems[0].reason,
        "Duplicate of live index enwiki_content_2. Reindex in progress?"
    );
}

#[tokio::test]
async fn test_full_run_all_clusters_down() {
    let chi = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&chi)
        .await;

    let fetcher = Arc::new(HttpStateFetcher::new(Duration::from_secs(5)).unwrap());
    let run = run_fleet_check(&local_layout(&[("chi", &chi)]), &[], fetcher, RunOptions::default())
        .await
        .unwrap();

    assert!(run.all_failed());
    assert!(!run.is_partial());
    assert!(run.report.is_clean());
}

#[tokio::test]
async fn test_full_run_rejects_invalid_layout() {
    let mut layout = FleetLayout::default();
    layout.common_acceptors.push(indexcheck_core::fleet::AcceptorSpec::pattern("(["));
    let err = run_fleet_check(
        &layout,
        &[],
        Arc::new(StubFetcher::new("none")),
        RunOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, FleetError::Core(_)));
}
