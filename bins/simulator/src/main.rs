//! Scholarflow workflow simulator
//!
//! Seeds an in-memory store and walks sample applications through the
//! configured approval workflow, logging every transition.
//!
//! Usage: cargo run --bin simulator

mod scenario;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use scholarflow_shared::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    info!(
        steps = ?config.workflow.default_steps,
        admin_override = config.workflow.admin_override,
        "Configuration loaded"
    );

    let summary = scenario::run(&config).await?;
    info!(
        approved = summary.approved,
        rejected = summary.rejected,
        refused = summary.refused,
        payments = summary.payments,
        notifications = summary.notifications,
        audit_entries = summary.audit_entries,
        "Simulation finished"
    );

    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_filter_admits_simulator_events() {
        let filter = EnvFilter::new(LoggingConfig::default().filter);
        let subscriber = tracing_subscriber::registry().with(filter);

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(Level::INFO));
            assert!(tracing::enabled!(target: "simulator::scenario", Level::WARN));
            assert!(tracing::enabled!(
                target: "scholarflow_core::application::service",
                Level::INFO
            ));
            assert!(!tracing::enabled!(target: "simulator", Level::DEBUG));
        });
    }
}
