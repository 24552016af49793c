// Tier 3: placeholder data, no external inputs. Reports carry `source = mock-data`.

use super::{StatsTier, TierError, cycle_rng};
use crate::models::{CpuStats, DiskStats, MemoryStats, StatsReport, StatsSource};
use async_trait::async_trait;
use rand::Rng;

pub const MOCK_CORE_COUNT: usize = 4;
pub const MOCK_DISK_DEVICE: &str = "/dev/sda1";

/// Random integer usage in [10, 70), four integer cores in [0, 100),
/// and fixed memory (16/8/8 GiB, 50%) and disk (500/250/250 GiB, 50%) snapshots.
pub fn synthetic_report(rng: &mut impl Rng) -> StatsReport {
    let usage = rng.random_range(10..70u32) as f64;
    let cores = (0..MOCK_CORE_COUNT)
        .map(|_| rng.random_range(0..100u32) as f64)
        .collect();
    StatsReport::new(
        CpuStats::new(usage, cores),
        MemoryStats {
            total: 16.0,
            used: 8.0,
            free: 8.0,
            percent: 50.0,
        },
        vec![DiskStats::new(MOCK_DISK_DEVICE, 500.0, 250.0, 250.0, 50.0)],
        StatsSource::Synthetic,
    )
}

#[derive(Debug, Default)]
pub struct SyntheticTier {
    seed: Option<u64>,
}

impl SyntheticTier {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl StatsTier for SyntheticTier {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn collect(&self) -> Result<StatsReport, TierError> {
        let mut rng = cycle_rng(self.seed);
        Ok(synthetic_report(&mut rng))
    }
}
