//! The rosdep database: rules mapping rosdep keys to system packages.
use std::collections::HashMap;

use mash_recipe::KeyResolver;
use reqwest_middleware::ClientWithMiddleware;
use serde_yaml::{Mapping, Value};

use crate::{
    RosdepError,
    fetch::{Location, read_yaml},
    sources::DataSource,
};

/// Version key matching every OS release.
const ANY_VERSION: &str = "*";

/// Rules of all loaded sources. A key is defined by the first source that
/// mentions it.
#[derive(Debug, Default, Clone)]
pub struct RosdepDatabase {
    rules: HashMap<String, Value>,
}

impl RosdepDatabase {
    /// Add the rules of one YAML document, keeping existing definitions.
    pub fn merge(&mut self, document: Mapping) {
        for (key, rule) in document {
            let Value::String(key) = key else {
                continue;
            };
            self.rules.entry(key).or_insert(rule);
        }
    }

    /// Build a database from YAML documents, in precedence order.
    pub fn from_documents<'a>(
        documents: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, RosdepError> {
        let mut database = Self::default();
        for (index, document) in documents.into_iter().enumerate() {
            let document = serde_yaml::from_str(document).map_err(|source| RosdepError::Yaml {
                location: format!("document {index}"),
                source,
            })?;
            database.merge(document);
        }
        Ok(database)
    }

    /// Download all sources, in precedence order. Sources that cannot be
    /// read are skipped with a warning.
    pub async fn load(client: &ClientWithMiddleware, sources: &[DataSource]) -> Self {
        let mut database = Self::default();
        for source in sources {
            let document = match Location::parse(&source.url) {
                Ok(location) => read_yaml::<Mapping>(client, &location).await,
                Err(e) => Err(e),
            };
            match document {
                Ok(document) => {
                    tracing::debug!("loaded {} rosdep rules from {}", document.len(), source.url);
                    database.merge(document);
                }
                Err(e) => tracing::warn!("skipping rosdep source {}: {e}", source.url),
            }
        }
        database
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up the packages providing `key` on `os_name`/`os_version`.
    pub fn lookup(
        &self,
        key: &str,
        os_name: &str,
        os_version: &str,
    ) -> Result<Vec<String>, RosdepError> {
        let rule = self
            .rules
            .get(key)
            .ok_or_else(|| RosdepError::UnknownKey(key.to_string()))?;

        let invalid = || RosdepError::InvalidRule {
            key: key.to_string(),
            os_name: os_name.to_string(),
        };

        let os_rule = rule
            .as_mapping()
            .ok_or_else(invalid)?
            .get(os_name)
            .ok_or_else(|| RosdepError::UnsupportedOs {
                key: key.to_string(),
                os_name: os_name.to_string(),
            })?;

        packages(unwrap_installer(select_version(os_rule, os_version))).ok_or_else(invalid)
    }
}

impl KeyResolver for RosdepDatabase {
    type Error = RosdepError;

    fn resolve(
        &self,
        key: &str,
        os_name: &str,
        os_version: &str,
        _distro: &str,
    ) -> Result<Vec<String>, Self::Error> {
        self.lookup(key, os_name, os_version)
    }
}

/// Rules may be keyed by OS release, with `*` matching all releases.
fn select_version<'a>(rule: &'a Value, os_version: &str) -> &'a Value {
    let Some(versions) = rule.as_mapping() else {
        return rule;
    };
    if !os_version.is_empty()
        && let Some(rule) = versions.get(os_version)
    {
        return rule;
    }
    versions.get(ANY_VERSION).unwrap_or(rule)
}

/// Unwrap `packages: [...]`, optionally nested under an installer name.
fn unwrap_installer(rule: &Value) -> &Value {
    let Some(mapping) = rule.as_mapping() else {
        return rule;
    };
    if let Some(packages) = mapping.get("packages") {
        return packages;
    }
    match mapping.values().next() {
        Some(Value::Mapping(installer)) if mapping.len() == 1 => {
            installer.get("packages").unwrap_or(rule)
        }
        _ => rule,
    }
}

fn packages(rule: &Value) -> Option<Vec<String>> {
    match rule {
        Value::Null => Some(Vec::new()),
        Value::String(packages) => Some(packages.split_whitespace().map(str::to_string).collect()),
        Value::Sequence(packages) => packages
            .iter()
            .map(|package| package.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}
