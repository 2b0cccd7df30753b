//! Configuration types for the MQTT ACL agent
//!
//! Provides JSON-serializable configuration for subscription ACL checks and
//! the backend that supplies ACL pattern templates.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::mqtt::MAX_TOPIC_FILTER_LENGTH;

/// MQTT ACL Agent Configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct MqttAclConfig {
    /// Access Control Lists
    pub acl: AclConfig,
}

impl MqttAclConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

// ============================================================================
// ACL Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AclConfig {
    /// Enable ACL enforcement
    pub enabled: bool,

    /// Action when no pattern covers the request
    pub default_action: AclAction,

    /// Maximum topic filter length in bytes
    #[serde(default = "default_max_filter_length")]
    pub max_filter_length: usize,

    /// Where ACL pattern templates come from
    pub backend: BackendConfig,
}

impl Default for AclConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_action: AclAction::Deny,
            max_filter_length: default_max_filter_length(),
            backend: BackendConfig::default(),
        }
    }
}

/// ACL pattern source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum BackendConfig {
    /// Patterns listed inline
    Static {
        /// Templates applying to every client (`%c` and `%u` are expanded)
        #[serde(default)]
        patterns: Vec<String>,
        /// Per-user topic filters
        #[serde(default)]
        users: HashMap<String, Vec<String>>,
    },

    /// Patterns loaded from a JSON file
    File {
        path: PathBuf,
        /// Reload file on every lookup (for development)
        #[serde(default, rename = "hot-reload")]
        hot_reload: bool,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Static {
            patterns: Vec::new(),
            users: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AclAction {
    #[default]
    Deny,
    Allow,
}

// ============================================================================
// Connection Context (runtime state per connection)
// ============================================================================

/// Identity of an MQTT connection, as used for pattern expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionContext {
    /// Client ID from CONNECT
    pub client_id: String,
    /// Username from CONNECT (if provided)
    pub username: Option<String>,
}

impl ConnectionContext {
    pub fn new(client_id: &str, username: Option<&str>) -> Self {
        Self {
            client_id: client_id.to_string(),
            username: username.map(|s| s.to_string()),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_max_filter_length() -> usize {
    MAX_TOPIC_FILTER_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = MqttAclConfig::default();
        assert!(config.acl.enabled);
        assert_eq!(config.acl.default_action, AclAction::Deny);
        assert_eq!(config.acl.max_filter_length, MAX_TOPIC_FILTER_LENGTH);
        assert!(matches!(config.acl.backend, BackendConfig::Static { .. }));
    }

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "acl": {
                "enabled": true,
                "default-action": "deny",
                "max-filter-length": 1024,
                "backend": {
                    "type": "static",
                    "patterns": ["devices/%c/#"],
                    "users": {"alice": ["user/alice/+"]}
                }
            }
        }"#;

        let config: MqttAclConfig = serde_json::from_str(json).expect("Failed to parse");
        assert!(config.acl.enabled);
        assert_eq!(config.acl.max_filter_length, 1024);
        match config.acl.backend {
            BackendConfig::Static { patterns, users } => {
                assert_eq!(patterns, vec!["devices/%c/#".to_string()]);
                assert_eq!(users["alice"], vec!["user/alice/+".to_string()]);
            }
            other => panic!("Expected static backend, got {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_file_backend() {
        let json = r#"{
            "acl": {
                "default-action": "allow",
                "backend": {"type": "file", "path": "/etc/mqtt/acl.json", "hot-reload": true}
            }
        }"#;

        let config: MqttAclConfig = serde_json::from_str(json).expect("Failed to parse");
        assert_eq!(config.acl.default_action, AclAction::Allow);
        assert_eq!(config.acl.max_filter_length, MAX_TOPIC_FILTER_LENGTH);
        match config.acl.backend {
            BackendConfig::File { path, hot_reload } => {
                assert_eq!(path, PathBuf::from("/etc/mqtt/acl.json"));
                assert!(hot_reload);
            }
            other => panic!("Expected file backend, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"acl": {"enabled": false}}"#).unwrap();

        let config = MqttAclConfig::from_file(file.path()).unwrap();
        assert!(!config.acl.enabled);

        let missing = MqttAclConfig::from_file(Path::new("/nonexistent/acl-config.json"));
        assert!(missing.is_err());
    }
}
