//! ACL backends
//!
//! A backend resolves the raw ACL pattern templates that apply to a client.
//! Matching and expansion happen in [`crate::acl`]; backends only supply
//! the patterns.

mod file;

pub use file::FileBackend;

use crate::config::BackendConfig;
use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// ACL pattern provider trait
pub trait AclBackend: Send + Sync {
    /// Pattern templates for a client, global patterns first
    fn acl_patterns(&self, client_id: &str, username: Option<&str>) -> Result<Vec<String>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// ACL entries as stored in a backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AclEntries {
    /// Templates applying to every client
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Map of username to topic filters
    #[serde(default)]
    pub users: HashMap<String, Vec<String>>,
}

impl AclEntries {
    /// Global patterns followed by the user's own topics
    pub fn lookup(&self, username: Option<&str>) -> Vec<String> {
        let user_topics = username
            .and_then(|u| self.users.get(u))
            .map(Vec::as_slice)
            .unwrap_or_default();

        self.patterns
            .iter()
            .chain(user_topics)
            .cloned()
            .collect()
    }
}

/// Backend serving entries given at construction
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    entries: AclEntries,
}

impl StaticBackend {
    pub fn new(patterns: Vec<String>, users: HashMap<String, Vec<String>>) -> Self {
        Self {
            entries: AclEntries { patterns, users },
        }
    }

    /// Backend granting the same patterns to everyone
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(patterns.into_iter().map(Into::into).collect(), HashMap::new())
    }
}

impl AclBackend for StaticBackend {
    fn acl_patterns(&self, _client_id: &str, username: Option<&str>) -> Result<Vec<String>> {
        Ok(self.entries.lookup(username))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Build the backend described by the configuration
pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn AclBackend>> {
    let backend: Arc<dyn AclBackend> = match config {
        BackendConfig::Static { patterns, users } => {
            Arc::new(StaticBackend::new(patterns.clone(), users.clone()))
        }
        BackendConfig::File { path, hot_reload } => {
            Arc::new(FileBackend::from_file(path, *hot_reload)?)
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> AclEntries {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), vec!["user/alice/#".to_string()]);
        AclEntries {
            patterns: vec!["devices/%c/+".to_string(), "public/#".to_string()],
            users,
        }
    }

    #[test]
    fn test_lookup_known_user() {
        let patterns = entries().lookup(Some("alice"));
        assert_eq!(patterns, vec!["devices/%c/+", "public/#", "user/alice/#"]);
    }

    #[test]
    fn test_lookup_unknown_and_anonymous() {
        assert_eq!(entries().lookup(Some("mallory")), vec!["devices/%c/+", "public/#"]);
        assert_eq!(entries().lookup(None), vec!["devices/%c/+", "public/#"]);
    }

    #[test]
    fn test_static_backend() {
        let backend = StaticBackend::with_patterns(["a/#", "b/+"]);
        assert_eq!(backend.acl_patterns("c1", None).unwrap(), vec!["a/#", "b/+"]);
        assert_eq!(backend.name(), "static");
    }

    #[test]
    fn test_from_config_static() {
        let backend = from_config(&BackendConfig::default()).unwrap();
        assert_eq!(backend.name(), "static");
        assert!(backend.acl_patterns("c1", Some("u1")).unwrap().is_empty());
    }

    #[test]
    fn test_from_config_missing_file() {
        let config = BackendConfig::File {
            path: "/nonexistent/acl.json".into(),
            hot_reload: false,
        };
        assert!(from_config(&config).is_err());
    }
}
