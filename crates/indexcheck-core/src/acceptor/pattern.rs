//! Regex-based acceptor for cluster-local system and plugin indices.

use regex::Regex;
use std::collections::BTreeSet;

use super::Acceptor;
use crate::error::{CoreError, CoreResult};
use crate::model::ObservedState;

/// Accept observed indices by regex match against the index name.
#[derive(Debug, Clone)]
pub struct PatternAcceptor {
    pattern: Regex,
}

impl PatternAcceptor {
    /// Compile a pattern acceptor.
    pub fn new(pattern: &str) -> CoreResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    /// Wrap an already compiled regex.
    #[must_use]
    pub fn from_regex(pattern: Regex) -> Self {
        Self { pattern }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Acceptor for PatternAcceptor {
    fn name(&self) -> &str {
        self.pattern.as_str()
    }

    fn accept(&self, state: &ObservedState) -> BTreeSet<String> {
        state
            .indices
            .iter()
            .filter(|index| self.pattern.is_match(index))
            .cloned()
            .collect()
    }
}
