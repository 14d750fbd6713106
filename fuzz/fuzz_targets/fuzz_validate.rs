//! Fuzz target for cluster validation.
//!
//! Builds an observed state from newline-separated `index` or `alias=index`
//! entries and checks that every observed index is either claimed or
//! reported as extra, and every claimed index is either observed or reported
//! as missing.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_validate -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::collections::BTreeSet;

use indexcheck_core::engine::validate;
use indexcheck_core::fleet::FleetLayout;
use indexcheck_core::model::{ClusterKey, ExpectedIndices, ObservedState, ProblemKind};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(clusters) = FleetLayout::default().build_clusters(&ExpectedIndices::default()) else {
        return;
    };
    let Some(config) = clusters.first() else {
        return;
    };

    let mut state = ObservedState::new(config.name.clone(), ClusterKey::new("eqiad", "chi"));
    for line in s.lines() {
        state = match line.split_once('=') {
            Some((alias, index)) => state.with_alias(alias, index),
            None => state.with_index(line),
        };
    }

    let problems = validate(config, &state);
    let extra: BTreeSet<&str> = problems
        .iter()
        .filter(|p| p.kind == ProblemKind::Extra)
        .map(|p| p.index.as_str())
        .collect();
    let missing: BTreeSet<&str> = problems
        .iter()
        .filter(|p| p.kind == ProblemKind::Missing)
        .map(|p| p.index.as_str())
        .collect();

    for index in &state.indices {
        assert!(!missing.contains(index.as_str()));
    }
    for index in &extra {
        assert!(state.indices.contains(*index));
    }
    assert_eq!(validate(config, &state), problems);
});
