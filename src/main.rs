//! MQTT ACL check CLI
//!
//! Evaluates one subscription request against the configured ACL backend.
//! Exit status is 0 when allowed, 1 when denied and 2 when the request
//! filter is invalid.

use anyhow::Result;
use clap::Parser;
use sentinel_agent_mqtt_acl::config::ConnectionContext;
use sentinel_agent_mqtt_acl::{AclError, AclEvaluator, MqttAclConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// MQTT subscription ACL checker for Sentinel
#[derive(Parser, Debug)]
#[command(name = "mqtt-acl-check")]
#[command(author = "Sentinel Contributors")]
#[command(version)]
#[command(about = "Check an MQTT subscription against ACL patterns", long_about = None)]
struct Args {
    /// Requested subscription topic filter
    topic_filter: String,

    /// Client ID of the subscribing connection
    #[arg(short = 'i', long)]
    client_id: String,

    /// Username of the subscribing connection
    #[arg(short, long)]
    username: Option<String>,

    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Enable JSON log format
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        info!(path = %config_path.display(), "Loading configuration from file");
        MqttAclConfig::from_file(config_path)?
    } else {
        MqttAclConfig::default()
    };

    let evaluator = AclEvaluator::new(&config.acl)?;
    info!(backend = %evaluator.backend_name(), "ACL evaluator initialized");

    let context = ConnectionContext::new(&args.client_id, args.username.as_deref());

    match evaluator.can_subscribe(&context, &args.topic_filter) {
        Ok(decision) => {
            let verdict = if decision.allowed { "allow" } else { "deny" };
            println!("{}: {}", verdict, decision.reason);
            Ok(if decision.allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Err(AclError::InvalidArgument(reason)) => {
            warn!(topic_filter = %args.topic_filter, %reason, "Invalid subscription filter");
            println!("invalid: {}", reason);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}
