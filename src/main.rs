//! relay-probe: end-to-end checks for a TCP load balancer
//!
//! For every application in the configuration, each port is checked by:
//! - Echoing a short text, a long text and a binary payload over one connection
//! - A batch of concurrently opened connections
//! - A batch of sequentially opened connections
//!
//! The backends behind the load balancer are expected to echo
//! newline-delimited frames.

mod batch;
mod config;
mod context;
mod dialer;
mod payload;
mod protocols;
#[cfg(test)]
mod testutil;
mod validator;

use config::Config;
use dialer::TcpDialer;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use validator::Validator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to read configuration");
            return Err(e.into());
        }
    };

    info!(
        host = %config.host,
        timeout_ms = ?config.timeout_ms,
        apps = config.apps.len(),
        "Starting relay-probe"
    );
    for app in &config.apps {
        info!(app = %app.name, ports = ?app.ports, targets = ?app.targets, "configured application");
    }

    let dialer = Arc::new(TcpDialer::new(config.host.clone(), config.timeout()));
    let validator = Validator::new(dialer, config.timeout());

    let run = validator.validate_all(&config.apps).await;
    validator::log_summary(&run);

    Ok(())
}
