// Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use hoststats::collector::{StatsTier, TierError};
use hoststats::config::MonitorConfig;
use hoststats::models::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn monitor_config(seed: u64) -> MonitorConfig {
    MonitorConfig {
        random_seed: Some(seed),
        ..MonitorConfig::default()
    }
}

pub fn sample_report(source: StatsSource) -> StatsReport {
    StatsReport::new(
        CpuStats::new(12.5, vec![10.0, 15.0]),
        MemoryStats::from_percent(8.0, 25.0),
        vec![DiskStats::new("/dev/sda1", 100.0, 40.0, 60.0, 40.0)],
        source,
    )
}

/// Tier that always fails and counts how often it was asked.
pub struct FailingTier {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl StatsTier for FailingTier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn collect(&self) -> Result<StatsReport, TierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TierError::Timeout {
            program: "fake".into(),
            timeout_ms: 2000,
        })
    }
}

/// Tier that returns a fixed report and counts how often it was asked.
pub struct FixedTier {
    pub source: StatsSource,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl StatsTier for FixedTier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn collect(&self) -> Result<StatsReport, TierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(sample_report(self.source))
    }
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn assert_report_in_bounds(report: &StatsReport) {
    assert!((0.0..=100.0).contains(&report.cpu.usage));
    for core in &report.cpu.cores {
        assert!((0.0..=100.0).contains(core), "core {} out of range", core);
    }
    assert!((0.0..=100.0).contains(&report.memory.percent));
    for disk in &report.disks {
        assert!((0.0..=100.0).contains(&disk.percent));
    }
}
