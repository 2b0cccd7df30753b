//! Subscription ACL evaluation

use crate::backend::{self, AclBackend};
use crate::config::{AclAction, AclConfig, ConnectionContext};
use crate::error::Result;
use crate::mqtt::{MqttTopicValidator, TopicValidator};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

use super::matcher::AclMatcher;
use super::template::PatternTemplate;

/// Result of ACL evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclDecision {
    /// Whether the subscription is allowed
    pub allowed: bool,
    /// Expanded ACL filter that granted access (if any)
    pub pattern: Option<String>,
    /// Reason for the decision
    pub reason: String,
}

impl AclDecision {
    pub fn allow(pattern: &str) -> Self {
        Self {
            allowed: true,
            pattern: Some(pattern.to_string()),
            reason: format!("Allowed by pattern: {}", pattern),
        }
    }

    pub fn default_deny() -> Self {
        Self {
            allowed: false,
            pattern: None,
            reason: "No matching pattern, default deny".to_string(),
        }
    }

    pub fn default_allow() -> Self {
        Self {
            allowed: true,
            pattern: None,
            reason: "No matching pattern, default allow".to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            allowed: true,
            pattern: None,
            reason: "ACL disabled".to_string(),
        }
    }

    pub fn backend_failure(backend: &str) -> Self {
        Self {
            allowed: false,
            pattern: None,
            reason: format!("ACL backend '{}' unavailable, denied", backend),
        }
    }
}

/// ACL Evaluator - decides subscriptions against backend patterns
///
/// Patterns are tried in backend order and the first one covering the
/// request allows it. Otherwise the configured default action applies.
pub struct AclEvaluator {
    /// Source of pattern templates
    backend: Arc<RwLock<Arc<dyn AclBackend>>>,
    /// Default action when no pattern matches
    default_action: Arc<RwLock<AclAction>>,
    /// Filter matcher
    matcher: Arc<RwLock<AclMatcher>>,
    /// Whether ACL is enabled
    enabled: Arc<RwLock<bool>>,
}

impl AclEvaluator {
    /// Create a new ACL evaluator from configuration
    pub fn new(config: &AclConfig) -> anyhow::Result<Self> {
        let backend = backend::from_config(&config.backend)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Create an evaluator with an externally built backend
    ///
    /// The backend section of `config` is ignored.
    pub fn with_backend(config: &AclConfig, backend: Arc<dyn AclBackend>) -> Self {
        Self {
            backend: Arc::new(RwLock::new(backend)),
            default_action: Arc::new(RwLock::new(config.default_action)),
            matcher: Arc::new(RwLock::new(matcher_for(config))),
            enabled: Arc::new(RwLock::new(config.enabled)),
        }
    }

    /// Update settings and backend from new configuration
    pub fn reconfigure(&self, config: &AclConfig) -> anyhow::Result<()> {
        let backend = backend::from_config(&config.backend)?;

        *self.backend.write() = backend;
        *self.default_action.write() = config.default_action;
        *self.matcher.write() = matcher_for(config);
        *self.enabled.write() = config.enabled;

        Ok(())
    }

    /// Check if a topic filter can be subscribed to
    ///
    /// An invalid request filter is reported as
    /// [`AclError::InvalidArgument`](crate::error::AclError::InvalidArgument),
    /// never as a deny. Stored patterns that fail validation are skipped.
    pub fn can_subscribe(
        &self,
        context: &ConnectionContext,
        topic_filter: &str,
    ) -> Result<AclDecision> {
        // If ACL is disabled, allow everything
        if !*self.enabled.read() {
            return Ok(AclDecision::disabled());
        }

        let matcher = self.matcher.read().clone();
        matcher.validator().validate_sub_topic(topic_filter)?;

        let backend = self.backend.read().clone();
        let templates = match backend.acl_patterns(&context.client_id, context.username.as_deref())
        {
            Ok(templates) => templates,
            Err(e) => {
                warn!(
                    backend = %backend.name(),
                    client_id = %context.client_id,
                    error = %e,
                    "ACL backend lookup failed"
                );
                return Ok(AclDecision::backend_failure(backend.name()));
            }
        };

        for template in templates.into_iter().map(PatternTemplate::from) {
            // An identity carrying `+`, `#` or `/` would widen the pattern
            if !template.is_static() {
                if let Some(placeholder) = template.unsafe_placeholder(context) {
                    warn!(
                        template = %template,
                        placeholder,
                        client_id = %context.client_id,
                        username = ?context.username,
                        "Skipping ACL pattern, identity contains topic wildcards or separators"
                    );
                    continue;
                }
            }

            let pattern = template.expand_for(context)?;

            match matcher.matches(&pattern, topic_filter) {
                Ok(true) => {
                    debug!(
                        template = %template,
                        pattern = %pattern,
                        topic_filter = %topic_filter,
                        client_id = %context.client_id,
                        "ACL pattern matched"
                    );
                    return Ok(AclDecision::allow(&pattern));
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        template = %template,
                        pattern = %pattern,
                        expanded = !template.is_static(),
                        error_type = e.error_type(),
                        error = %e,
                        "Skipping invalid ACL pattern"
                    );
                }
            }
        }

        // No pattern matched, use default action
        let default = *self.default_action.read();
        debug!(
            topic_filter = %topic_filter,
            client_id = %context.client_id,
            default = ?default,
            "No ACL pattern matched, using default"
        );

        Ok(match default {
            AclAction::Allow => AclDecision::default_allow(),
            AclAction::Deny => AclDecision::default_deny(),
        })
    }

    /// Name of the active backend
    pub fn backend_name(&self) -> String {
        self.backend.read().name().to_string()
    }
}

fn matcher_for(config: &AclConfig) -> AclMatcher {
    AclMatcher::with_validator(MqttTopicValidator::with_max_length(config.max_filter_length))
}
