//! ACL pattern templates
//!
//! Patterns may contain `%c` (client id) and `%u` (username) placeholders,
//! which are substituted per connection to produce concrete ACL filters.

use crate::config::ConnectionContext;
use crate::error::{AclError, Result};
use crate::mqtt::LEVEL_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder marker
const MARKER: char = '%';

/// Piece of a template, in order of appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    ClientId,
    Username,
}

/// Iterator over the segments of a template
///
/// A `%` not followed by `c` or `u` stays part of the text.
struct Segments<'a> {
    rest: &'a str,
    pending: Option<Segment<'a>>,
}

impl<'a> Segments<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            rest: template,
            pending: None,
        }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(segment) = self.pending.take() {
            return Some(segment);
        }
        if self.rest.is_empty() {
            return None;
        }

        let mut search_from = 0;
        while let Some(offset) = self.rest[search_from..].find(MARKER) {
            let pos = search_from + offset;
            let placeholder = match self.rest.as_bytes().get(pos + 1) {
                Some(b'c') => Some(Segment::ClientId),
                Some(b'u') => Some(Segment::Username),
                _ => None,
            };

            match placeholder {
                Some(segment) => {
                    let text = &self.rest[..pos];
                    self.rest = &self.rest[pos + 2..];
                    if text.is_empty() {
                        return Some(segment);
                    }
                    self.pending = Some(segment);
                    return Some(Segment::Text(text));
                }
                None => search_from = pos + 1,
            }
        }

        let text = self.rest;
        self.rest = "";
        Some(Segment::Text(text))
    }
}

/// Check if a template contains any `%c` or `%u` placeholder
pub fn has_placeholders(template: &str) -> bool {
    Segments::new(template).any(|s| !matches!(s, Segment::Text(_)))
}

/// Substitute `%c` and `%u` in `template`
///
/// Absent values are substituted as empty strings. Substituted text is not
/// scanned again, so a client id of `%u` stays `%u`.
///
/// # Examples
/// ```
/// use sentinel_agent_mqtt_acl::acl::expand;
///
/// let pattern = expand(Some("dev1"), Some("alice"), "user/%u/client/%c").unwrap();
/// assert_eq!(pattern, "user/alice/client/dev1");
///
/// let pattern = expand(None, Some("alice"), "u/%u/c/%c").unwrap();
/// assert_eq!(pattern, "u/alice/c/");
/// ```
pub fn expand(client_id: Option<&str>, username: Option<&str>, template: &str) -> Result<String> {
    let client_id = client_id.unwrap_or("");
    let username = username.unwrap_or("");

    let capacity = Segments::new(template)
        .map(|segment| match segment {
            Segment::Text(text) => text.len(),
            Segment::ClientId => client_id.len(),
            Segment::Username => username.len(),
        })
        .try_fold(0usize, |total, len| total.checked_add(len))
        .ok_or(AclError::AllocationFailure)?;

    let mut expanded = String::new();
    expanded
        .try_reserve_exact(capacity)
        .map_err(|_| AclError::AllocationFailure)?;

    for segment in Segments::new(template) {
        match segment {
            Segment::Text(text) => expanded.push_str(text),
            Segment::ClientId => expanded.push_str(client_id),
            Segment::Username => expanded.push_str(username),
        }
    }

    Ok(expanded)
}

/// An ACL pattern that may contain identity placeholders
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternTemplate(String);

impl PatternTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the pattern is the same for every connection
    pub fn is_static(&self) -> bool {
        !has_placeholders(&self.0)
    }

    /// Expand the pattern for a connection
    pub fn expand_for(&self, context: &ConnectionContext) -> Result<String> {
        expand(
            Some(&context.client_id),
            context.username.as_deref(),
            &self.0,
        )
    }

    /// Name of the first placeholder whose value for `context` would add
    /// topic structure (`+`, `#` or `/`) to the expanded pattern
    pub fn unsafe_placeholder(&self, context: &ConnectionContext) -> Option<&'static str> {
        let adds_structure = |value: &str| value.contains(['+', '#', LEVEL_SEPARATOR]);

        Segments::new(&self.0).find_map(|segment| match segment {
            Segment::ClientId if adds_structure(&context.client_id) => Some("client_id"),
            Segment::Username if adds_structure(context.username.as_deref().unwrap_or("")) => {
                Some("username")
            }
            _ => None,
        })
    }
}

impl From<String> for PatternTemplate {
    fn from(template: String) -> Self {
        Self(template)
    }
}

impl From<&str> for PatternTemplate {
    fn from(template: &str) -> Self {
        Self(template.to_string())
    }
}

impl fmt::Display for PatternTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
