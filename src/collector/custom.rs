// Tier 1: operator-supplied monitor executable with terse text output.
//
// Expected lines (any order, extra text ignored):
//   CPU Usage: 42.5%
//   Memory Usage: 33%
//   Disk /dev/sda1: 20% used
//
// The format carries no capacities or per-core data, so memory total is a fixed 16 GiB,
// disk total is a nominal 100 (used/free are then percentages, not GiB), and cores are random.

use super::command::{CommandSpec, run_command};
use super::{StatsTier, TierError, cycle_rng};
use crate::config::MonitorConfig;
use crate::models::{
    CpuStats, DiskStats, MemoryStats, StatsReport, StatsSource, clamp_percent,
};
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::instrument;

/// Memory capacity assumed for the custom monitor (GiB).
pub const NOMINAL_MEMORY_TOTAL: f64 = 16.0;
/// Disk capacity placeholder for the custom monitor.
pub const NOMINAL_DISK_TOTAL: f64 = 100.0;
/// Number of synthesized cores reported by the custom monitor tier.
pub const SYNTHETIC_CORE_COUNT: usize = 4;

struct Patterns {
    cpu: Regex,
    memory: Regex,
    disk: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    cpu: Regex::new(r"CPU Usage: (\d+(?:\.\d+)?)%").expect("cpu usage pattern"),
    memory: Regex::new(r"Memory Usage: (\d+(?:\.\d+)?)%").expect("memory usage pattern"),
    disk: Regex::new(r"Disk (\S+): (\d+(?:\.\d+)?)% used").expect("disk usage pattern"),
});

/// Values extracted from custom monitor output.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomReading {
    pub cpu_usage: f64,
    pub memory_percent: f64,
    /// (device, percent used) in order of appearance.
    pub disks: Vec<(String, f64)>,
}

/// Extracts the first CPU and memory figures and every disk line.
/// Missing CPU or memory figures read as 0, so any output that ran to a zero exit parses.
pub fn parse_custom_output(text: &str) -> CustomReading {
    let patterns = &*PATTERNS;

    let first_number = |re: &Regex| -> Option<f64> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    };
    let cpu = first_number(&patterns.cpu);
    let memory = first_number(&patterns.memory);

    let mut disks: Vec<(String, f64)> = Vec::new();
    for caps in patterns.disk.captures_iter(text) {
        let (Some(device), Some(percent)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Ok(percent) = percent.as_str().parse::<f64>() else {
            continue;
        };
        disks.push((device.as_str().to_string(), percent));
    }

    CustomReading {
        cpu_usage: cpu.unwrap_or(0.0),
        memory_percent: memory.unwrap_or(0.0),
        disks,
    }
}

/// Turns a parsed reading into a report, filling capacities and cores with placeholders.
pub fn build_custom_report(reading: &CustomReading, rng: &mut impl Rng) -> StatsReport {
    let cores = (0..SYNTHETIC_CORE_COUNT)
        .map(|_| rng.random_range(0.0..100.0))
        .collect();
    let disks = reading
        .disks
        .iter()
        .map(|(device, percent)| {
            let percent = clamp_percent(*percent);
            DiskStats::new(
                device.clone(),
                NOMINAL_DISK_TOTAL,
                percent,
                NOMINAL_DISK_TOTAL - percent,
                percent,
            )
        })
        .collect();
    StatsReport::new(
        CpuStats::new(reading.cpu_usage, cores),
        MemoryStats::from_percent(NOMINAL_MEMORY_TOTAL, reading.memory_percent),
        disks,
        StatsSource::Custom,
    )
}

pub struct CustomMonitorTier {
    command: CommandSpec,
    timeout: Duration,
    seed: Option<u64>,
}

impl CustomMonitorTier {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            command: CommandSpec {
                program: config.command_path().to_string_lossy().into_owned(),
                args: Vec::new(),
            },
            timeout: Duration::from_millis(config.command_timeout_ms),
            seed: config.random_seed,
        }
    }
}

#[async_trait]
impl StatsTier for CustomMonitorTier {
    fn name(&self) -> &'static str {
        "custom"
    }

    #[instrument(skip(self), fields(tier = "custom"))]
    async fn collect(&self) -> Result<StatsReport, TierError> {
        let stdout = run_command(&self.command, self.timeout).await?;
        let reading = parse_custom_output(&stdout);
        let mut rng = cycle_rng(self.seed);
        Ok(build_custom_report(&reading, &mut rng))
    }
}
