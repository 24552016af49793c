// CPU, memory, disk and report models (JSON wire format)

use serde::{Deserialize, Serialize};

/// Which tier produced a report. Always serialized so callers never infer it from absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsSource {
    #[serde(rename = "custom-monitor")]
    Custom,
    #[serde(rename = "built-in-commands")]
    BuiltIn,
    #[serde(rename = "mock-data")]
    Synthetic,
}

impl StatsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            StatsSource::Custom => "custom-monitor",
            StatsSource::BuiltIn => "built-in-commands",
            StatsSource::Synthetic => "mock-data",
        }
    }
}

impl std::fmt::Display for StatsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    /// Aggregate usage in percent.
    pub usage: f64,
    /// One entry per logical core, index = core id. Synthesized by every tier (see collector docs).
    pub cores: Vec<f64>,
}

impl CpuStats {
    pub fn new(usage: f64, cores: Vec<f64>) -> Self {
        Self {
            usage: clamp_percent(usage),
            cores: cores.into_iter().map(clamp_percent).collect(),
        }
    }
}

/// Memory in GiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub percent: f64,
}

impl MemoryStats {
    /// Back-computes used/free from a usage percentage and a known total.
    pub fn from_percent(total: f64, percent: f64) -> Self {
        let percent = clamp_percent(percent);
        let used = total * percent / 100.0;
        Self {
            total,
            used,
            free: total - used,
            percent,
        }
    }

    /// Measured columns in MiB; percent is derived from used/total.
    /// Free is taken as reported, so used + free may be less than total (buffers/cache).
    pub fn from_mebibytes(total_mb: u64, used_mb: u64, free_mb: u64) -> Option<Self> {
        if total_mb == 0 {
            return None;
        }
        let total = total_mb as f64 / 1024.0;
        let used = used_mb as f64 / 1024.0;
        let free = free_mb as f64 / 1024.0;
        Some(Self {
            total,
            used,
            free,
            percent: clamp_percent(used / total * 100.0),
        })
    }
}

/// One mounted filesystem, sizes in GiB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub device: String,
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub percent: f64,
}

impl DiskStats {
    pub fn new(device: impl Into<String>, total: f64, used: f64, free: f64, percent: f64) -> Self {
        Self {
            device: device.into(),
            total,
            used,
            free,
            percent: clamp_percent(percent),
        }
    }
}

/// Normalized result of one collection cycle. Built fresh every cycle and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disks: Vec<DiskStats>,
    pub source: StatsSource,
}

impl StatsReport {
    /// Assembles a report, dropping later disks that repeat an earlier device.
    pub fn new(
        cpu: CpuStats,
        memory: MemoryStats,
        disks: Vec<DiskStats>,
        source: StatsSource,
    ) -> Self {
        let mut unique: Vec<DiskStats> = Vec::with_capacity(disks.len());
        for disk in disks {
            if !unique.iter().any(|d| d.device == disk.device) {
                unique.push(disk);
            }
        }
        Self {
            cpu,
            memory,
            disks: unique,
            source,
        }
    }
}

/// Clamps to [0, 100]; NaN becomes 0.
pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
