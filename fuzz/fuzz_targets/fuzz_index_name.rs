//! Fuzz target for index name parsing and diagnosis.
//!
//! Arbitrary names must parse without panicking, and every parsed name must
//! come back out of its own alias and marker.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_index_name -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;

use indexcheck_core::explain::{diagnose, IndexName};
use indexcheck_core::model::{
    ClusterKey, ExpectedIndices, ExpectedTenantState, ObservedState, ObservedStates, Problem,
    ProblemKind, TenantCluster,
};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let Some(name) = IndexName::parse(s) else {
        return;
    };
    assert_eq!(format!("{}_{}", name.alias(), name.marker), s);

    let key = ClusterKey::new("eqiad", "chi");
    let expected = ExpectedIndices::from_tenant_states(&[ExpectedTenantState {
        tenant: name.tenant.clone(),
        clusters: vec![TenantCluster {
            replica: "eqiad".to_string(),
            group: "chi".to_string(),
            aliases: vec![name.alias()],
        }],
    }]);
    let states: ObservedStates = std::iter::once(
        ObservedState::new("production-search-eqiad", key.clone())
            .with_index(s)
            .with_alias(name.alias(), s),
    )
    .collect();
    let problem = Problem::new(key, s, ProblemKind::Extra, "Index not expected on cluster");

    // The alias is expected here, so a diagnosis always exists.
    let diagnosis = diagnose(&expected, &problem, &states);
    assert!(diagnosis.is_some());
    assert!(!diagnosis.map(|d| d.to_string()).unwrap_or_default().is_empty());
});
