//! Background healing sweep.
//!
//! # Responsibilities
//! - Periodically call `check()` on every registered circuit
//! - Stop when shutdown is signalled
//!
//! # Design Decisions
//! - Disabled by default: without it healing stays lazy (first call after expiry)
//! - Busy circuits are skipped rather than waited on

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::breaker::registry::BreakerRegistry;
use crate::config::SweepConfig;

pub struct HealingSweep {
    registry: Arc<BreakerRegistry>,
    config: SweepConfig,
}

impl HealingSweep {
    pub fn new(registry: Arc<BreakerRegistry>, config: SweepConfig) -> Self {
        Self { registry, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Healing sweep disabled");
            return;
        }

        tracing::info!(interval_ms = self.config.interval_ms, "Healing sweep starting");

        let mut ticker = time::interval(Duration::from_millis(self.config.interval_ms));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let healed = self.registry.sweep();
                    if healed > 0 {
                        tracing::debug!(healed, "Healing sweep pass complete");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Healing sweep received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
