//! Service entry point.
//!
//! Runs the streaming sync workers until interrupted. With the `reindex`
//! argument it instead performs a one-shot full rebuild of every
//! configured index and exits, reporting per-binding outcomes.

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use search_sync::{Dependencies, SyncError};

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut deps = Dependencies::new().await?;

    let reindex_only = std::env::args().nth(1).as_deref() == Some("reindex");
    if reindex_only {
        return reindex(&deps).await;
    }

    deps.supervisor.start(&deps.bindings);
    info!("Sync service running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    deps.supervisor.stop().await;
    info!("Shutdown complete");
    Ok(())
}

/// Administrative "reinitialize now" trigger.
async fn reindex(deps: &Dependencies) -> Result<(), SyncError> {
    info!(bindings = deps.bindings.len(), "Starting full reindex");
    let report = deps.supervisor.reindex_all(&deps.bindings).await;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(stats) => {
                info!(index = %outcome.index_name, indexed = stats.indexed, "Reindex succeeded");
            }
            Err(e) => {
                error!(index = %outcome.index_name, error = %e, "Reindex failed");
            }
        }
    }

    if !report.is_success() {
        return Err(SyncError::config(format!(
            "{} of {} bindings failed to reindex",
            report.failed(),
            report.outcomes.len()
        )));
    }
    Ok(())
}
