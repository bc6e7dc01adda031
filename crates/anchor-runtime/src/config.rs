//! Runtime configuration.
//!
//! Everything is driven by `ANCHOR_*` environment variables with sane
//! defaults; there is no config file. Engine tuning lives in
//! [`AnchorConfig`], scheduling and wiring choices here.

use anchor_engine::AnchorConfig;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

/// Full configuration for one runtime process.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Engine tuning (batch bounds, confirmation depth, retry budget).
    pub engine: AnchorConfig,
    /// Ledger network label, recorded in references.
    pub network: String,
    /// Seconds between formation cycles (each cycle also submits).
    pub formation_interval_secs: u64,
    /// Seconds between confirmation polls.
    pub confirmation_interval_secs: u64,
    /// When set, the formation lease is a file lock in this directory,
    /// shared with any other process pointed at it. Unset means a
    /// single-process in-memory lease.
    pub data_dir: Option<PathBuf>,
    /// Number of demo records to seed at startup. Zero disables
    /// seeding; nonzero is for local runs against the scripted ledger.
    pub demo_records: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            engine: AnchorConfig::default(),
            network: "anchornet".to_string(),
            formation_interval_secs: 300,
            confirmation_interval_secs: 60,
            data_dir: None,
            demo_records: 0,
        }
    }
}

impl RuntimeConfig {
    /// Build configuration from `ANCHOR_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(network) = std::env::var("ANCHOR_NETWORK") {
            if !network.is_empty() {
                config.network = network;
            }
        }
        if let Some(dir) = std::env::var_os("ANCHOR_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        set_from_env("ANCHOR_FORMATION_INTERVAL_SECS", &mut config.formation_interval_secs);
        set_from_env(
            "ANCHOR_CONFIRMATION_INTERVAL_SECS",
            &mut config.confirmation_interval_secs,
        );
        set_from_env("ANCHOR_DEMO_RECORDS", &mut config.demo_records);

        set_from_env("ANCHOR_MIN_BATCH_SIZE", &mut config.engine.min_batch_size);
        set_from_env("ANCHOR_MAX_BATCH_SIZE", &mut config.engine.max_batch_size);
        set_from_env("ANCHOR_CONFIRMATION_DEPTH", &mut config.engine.confirmation_depth);
        set_from_env("ANCHOR_MAX_SUBMIT_ATTEMPTS", &mut config.engine.max_submit_attempts);
        set_from_env("ANCHOR_SUBMIT_BACKOFF_MS", &mut config.engine.submit_backoff_ms);
        set_from_env("ANCHOR_DROP_PATIENCE_SECS", &mut config.engine.drop_patience_secs);

        config
    }

    /// Reject combinations that would wedge the pipeline.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.min_batch_size == 0 {
            anyhow::bail!("ANCHOR_MIN_BATCH_SIZE must be at least 1");
        }
        if self.engine.min_batch_size > self.engine.max_batch_size {
            anyhow::bail!(
                "ANCHOR_MIN_BATCH_SIZE ({}) exceeds ANCHOR_MAX_BATCH_SIZE ({})",
                self.engine.min_batch_size,
                self.engine.max_batch_size
            );
        }
        if self.formation_interval_secs == 0 || self.confirmation_interval_secs == 0 {
            anyhow::bail!("scheduler intervals must be nonzero");
        }
        Ok(())
    }
}

fn set_from_env<T: FromStr>(key: &str, slot: &mut T) {
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *slot = value,
        Err(_) => warn!("ignoring unparseable {key}={raw}"),
    }
}
