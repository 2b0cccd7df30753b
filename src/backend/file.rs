//! File-based ACL backend

use super::{AclBackend, AclEntries};
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// ACL backend reading a JSON file of the form
///
/// ```json
/// {
///   "patterns": ["devices/%c/#"],
///   "users": { "alice": ["user/alice/+"] }
/// }
/// ```
pub struct FileBackend {
    /// Path to ACL file
    path: PathBuf,
    /// Cached entries
    entries: Arc<RwLock<AclEntries>>,
    /// Hot reload on every lookup
    hot_reload: bool,
}

impl FileBackend {
    /// Create from an ACL file
    pub fn from_file(path: &Path, hot_reload: bool) -> Result<Self> {
        let entries = load_acl_file(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            entries: Arc::new(RwLock::new(entries)),
            hot_reload,
        })
    }

    /// Reload entries from file
    pub fn reload(&self) -> Result<()> {
        let entries = load_acl_file(&self.path)?;
        *self.entries.write() = entries;
        Ok(())
    }

    /// Number of users with their own topics
    pub fn user_count(&self) -> usize {
        self.entries.read().users.len()
    }

    /// Number of global patterns
    pub fn pattern_count(&self) -> usize {
        self.entries.read().patterns.len()
    }
}

impl AclBackend for FileBackend {
    fn acl_patterns(&self, _client_id: &str, username: Option<&str>) -> Result<Vec<String>> {
        if self.hot_reload {
            if let Err(e) = self.reload() {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to hot reload ACL file, keeping cached entries"
                );
            }
        }

        Ok(self.entries.read().lookup(username))
    }

    fn name(&self) -> &str {
        "acl-file"
    }
}

fn load_acl_file(path: &Path) -> Result<AclEntries> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ACL file: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse ACL file: {}", path.display()))
}
