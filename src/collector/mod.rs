// Tiered stats acquisition: custom monitor -> built-in commands -> synthetic data

mod builtin;
mod command;
mod custom;
mod error;
mod synthetic;

pub use builtin::{
    BuiltinCommands, BuiltinCommandsTier, CORE_NOISE_SPREAD, MAX_CORE_COUNT, parse_core_count,
    parse_cpu_usage, parse_disk_line, parse_disks, parse_memory, parse_size_gib, synthesize_cores,
};
pub use command::{CommandSpec, run_command};
pub use custom::{
    CustomMonitorTier, CustomReading, NOMINAL_DISK_TOTAL, NOMINAL_MEMORY_TOTAL,
    SYNTHETIC_CORE_COUNT, build_custom_report, parse_custom_output,
};
pub use error::{CollectError, TierError};
pub use synthetic::{MOCK_CORE_COUNT, MOCK_DISK_DEVICE, SyntheticTier, synthetic_report};

use crate::config::MonitorConfig;
use crate::models::{StatsReport, StatsSource};
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::instrument;

/// One acquisition strategy: a full report, or an error meaning "try the next tier".
#[async_trait]
pub trait StatsTier: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn collect(&self) -> Result<StatsReport, TierError>;
}

/// RNG for one collection cycle. Seeded runs are reproducible; nothing is shared between cycles.
pub(crate) fn cycle_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Tries each tier in order and returns the first report. Stateless between calls.
pub struct StatsCollector {
    tiers: Vec<Box<dyn StatsTier>>,
}

impl StatsCollector {
    /// Custom monitor, then built-in commands, then synthetic data.
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_tiers(vec![
            Box::new(CustomMonitorTier::new(config)),
            Box::new(BuiltinCommandsTier::new(config)),
            Box::new(SyntheticTier::new(config.random_seed)),
        ])
    }

    pub fn with_tiers(tiers: Vec<Box<dyn StatsTier>>) -> Self {
        Self { tiers }
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Only fails when every tier failed; with a synthetic last tier that cannot happen.
    #[instrument(skip(self), fields(tiers = self.tiers.len()))]
    pub async fn collect(&self) -> Result<StatsReport, CollectError> {
        for tier in &self.tiers {
            match tier.collect().await {
                Ok(report) => {
                    if report.source == StatsSource::Synthetic {
                        tracing::warn!(tier = tier.name(), "no real stats source available, serving mock data");
                    }
                    tracing::debug!(tier = tier.name(), source = %report.source, "stats collected");
                    return Ok(report);
                }
                Err(e) => {
                    tracing::warn!(tier = tier.name(), error = %e, "stats tier unavailable, falling back");
                }
            }
        }
        tracing::error!(attempts = self.tiers.len(), "every stats tier failed");
        Err(CollectError::Exhausted {
            attempts: self.tiers.len(),
        })
    }
}
