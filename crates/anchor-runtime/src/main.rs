//! # Anchoring Runtime
//!
//! Binary entry point for the transaction anchoring pipeline.
//!
//! The runtime wires the engine's services onto concrete adapters and
//! plays the role of the external scheduler: batch formation (plus
//! submission) and confirmation polling each run on their own fixed
//! cadence until ctrl-c.
//!
//! ```text
//!   formation tick          confirmation tick
//!        │                         │
//!        v                         v
//!   form_batch()            poll_confirmations()
//!   submit_pending()               │
//!        │                         │
//!        └──────> shared bus <─────┘
//!                     │
//!                     v
//!               event log task
//! ```
//!
//! Configuration comes from `ANCHOR_*` environment variables; see
//! [`config::RuntimeConfig`].

mod config;
mod runtime;
mod seed;

use anyhow::{Context, Result};
use config::RuntimeConfig;
use runtime::AnchorRuntime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RuntimeConfig::from_env();
    config.validate().context("invalid configuration")?;

    info!("===========================================");
    info!("  LedgerAnchor Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("  network: {}", config.network);
    info!(
        "  batch bounds: {}..={}, confirmation depth: {}",
        config.engine.min_batch_size, config.engine.max_batch_size, config.engine.confirmation_depth
    );
    info!("===========================================");

    let runtime = AnchorRuntime::new(config).context("failed to wire the runtime")?;
    runtime.start().await?;

    info!("Pipeline is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
