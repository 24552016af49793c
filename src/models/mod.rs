// Report schema shared by every collection tier

mod report;

pub(crate) use report::clamp_percent;
pub use report::{CpuStats, DiskStats, MemoryStats, StatsReport, StatsSource};
