//! Acceptor for singleton shared services addressed through a fixed set of
//! aliases, such as a primary/rollback pair.

use std::collections::BTreeSet;

use super::Acceptor;
use crate::model::ObservedState;

/// Accept the concrete indices behind a fixed set of aliases.
///
/// Aliases that do not currently resolve are skipped, so the result holds
/// anywhere from zero to one index per alias.
#[derive(Debug, Clone)]
pub struct AliasSetAcceptor {
    name: String,
    aliases: BTreeSet<String>,
}

impl AliasSetAcceptor {
    pub fn new<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases: BTreeSet<String> = aliases.into_iter().map(Into::into).collect();
        let name = format!(
            "aliases[{}]",
            aliases.iter().cloned().collect::<Vec<_>>().join(",")
        );
        Self { name, aliases }
    }

    /// Alias set used for the query-suggestion service.
    #[must_use]
    pub fn glent() -> Self {
        Self::new(["glent_production", "glent_rollback"])
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }
}

impl Acceptor for AliasSetAcceptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn accept(&self, state: &ObservedState) -> BTreeSet<String> {
        self.aliases
            .iter()
            .filter_map(|alias| state.resolve(alias))
            .map(str::to_string)
            .collect()
    }
}
