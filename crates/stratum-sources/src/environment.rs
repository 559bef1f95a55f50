//! Environment variable scanner

use stratum_core::{Category, Locator, RawValue, key};
use tracing::debug;

use crate::Result;
use crate::event::{Event, Harvest, Source};

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "STRATUM_";

/// Harvests variables starting with a prefix.
///
/// The rest of the variable name is lower-cased and `__` separates levels, so
/// `STRATUM_USER__NAME` configures `user.name`. Variables whose remainder is
/// not a valid key are skipped.
#[derive(Debug, Clone)]
pub struct Environment {
    prefix: String,
    vars: Option<Vec<(String, String)>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Environment {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: None,
        }
    }

    /// Scan the given variables instead of the process environment.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The key a variable configures, if it is one of ours.
    pub fn key_for(&self, variable: &str) -> Option<String> {
        let rest = variable.strip_prefix(&self.prefix)?;
        let key = rest.to_lowercase().split("__").collect::<Vec<_>>().join(".");
        key::is_valid(&key).then_some(key)
    }
}

impl Source for Environment {
    fn describe(&self) -> String {
        format!("environment ({}*)", self.prefix)
    }

    fn harvest(&self) -> Result<Harvest> {
        let mut vars = match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        };
        // process environment order is unspecified
        vars.sort();

        let mut harvest = Harvest::new();
        for (variable, value) in vars {
            if !variable.starts_with(&self.prefix) {
                continue;
            }
            let Some(key) = self.key_for(&variable) else {
                debug!(%variable, "skipping environment variable that does not name a key");
                continue;
            };
            debug!(%variable, %key, "environment assignment");
            harvest.push(Event::new(
                key,
                RawValue::text(value),
                Category::Environment,
                Locator::environment(variable),
            ));
        }
        Ok(harvest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("STRATUM_USER__NAME", Some("user.name"))]
    #[case("STRATUM_DEBUG", Some("debug"))]
    #[case("STRATUM_A__B__C", Some("a.b.c"))]
    #[case("STRATUM_", None)]
    #[case("STRATUM_A____B", None)]
    #[case("OTHER_USER", None)]
    fn variables_map_to_keys(#[case] variable: &str, #[case] expected: Option<&str>) {
        let env = Environment::default();
        assert_eq!(env.key_for(variable).as_deref(), expected);
    }

    #[test]
    fn harvest_is_sorted_and_filtered() {
        let env = Environment::new("APP_").with_vars([
            ("PATH", "/usr/bin"),
            ("APP_ZETA", "last"),
            ("APP_USER__NAME", "{user.first} smith"),
            ("APP_9", "skipped"),
        ]);
        let harvest = env.harvest().unwrap();

        let keys: Vec<_> = harvest.events.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["user.name", "zeta"]);
        assert_eq!(harvest.events[0].value, RawValue::text("{user.first} smith"));
        assert_eq!(harvest.events[0].category, Category::Environment);
        assert_eq!(
            harvest.events[0].locator,
            Locator::environment("APP_USER__NAME")
        );
        assert!(harvest.positional.is_empty());
    }
}
