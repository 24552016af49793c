// Tier 2: standard OS utilities (top, free, df, /proc/stat), queried one after another.
//
// Per-core values are NOT measured: they are the aggregate usage plus bounded noise,
// one per counted core. True per-core load would need two /proc/stat samples.

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

/// Half-width of the noise added to aggregate usage for each synthesized core.
pub const CORE_NOISE_SPREAD: f64 = 15.0;

/// Upper bound on the logical core count accepted from the host.
pub const MAX_CORE_COUNT: usize = 4096;

static TOP_CPU_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*%?\s*(us|sy)\b").expect("top cpu field pattern")
});

/// The four sub-queries. Each runs under its own timeout.
#[derive(Debug, Clone)]
pub struct BuiltinCommands {
    pub cpu: CommandSpec,
    pub memory: CommandSpec,
    pub disks: CommandSpec,
    pub core_count: CommandSpec,
}

impl Default for BuiltinCommands {
    fn default() -> Self {
        Self {
            cpu: CommandSpec::new("top", &["-bn1"]),
            memory: CommandSpec::new("free", &["-m"]),
            disks: CommandSpec::new("df", &["-P", "-BG"]),
            core_count: CommandSpec::new("grep", &["-c", "^cpu[0-9]", "/proc/stat"]),
        }
    }
}

fn parse_number(token: &str, what: &'static str) -> Result<f64, TierError> {
    token
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| TierError::unparsable(what, format!("expected a number, got {:?}", token)))
}

/// Aggregate CPU usage. Accepts either a lone decimal, or `top -bn1` output where
/// usage is user + system from the `Cpu(s)` line.
pub fn parse_cpu_usage(text: &str) -> Result<f64, TierError> {
    let trimmed = text.trim();
    if let Ok(value) = parse_number(trimmed, "cpu usage") {
        return Ok(clamp_percent(value));
    }

    let line = trimmed
        .lines()
        .find(|l| l.contains("Cpu(s)"))
        .ok_or_else(|| TierError::unparsable("cpu usage", "no Cpu(s) line in top output"))?;
    let (mut user, mut system) = (None, None);
    for caps in TOP_CPU_FIELD.captures_iter(line) {
        let (Some(value), Some(label)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = parse_number(value.as_str(), "cpu usage")?;
        match label.as_str() {
            "us" if user.is_none() => user = Some(value),
            "sy" if system.is_none() => system = Some(value),
            _ => {}
        }
    }
    match (user, system) {
        (Some(us), Some(sy)) => Ok(clamp_percent(us + sy)),
        _ => Err(TierError::unparsable(
            "cpu usage",
            format!("missing us/sy fields in {:?}", line),
        )),
    }
}

/// `free -m` output: the `Mem:` row (or the first data row under a localized header)
/// gives total, used and free in MiB.
pub fn parse_memory(text: &str) -> Result<MemoryStats, TierError> {
    let row = text
        .lines()
        .find(|l| l.trim_start().starts_with("Mem:"))
        .or_else(|| text.lines().filter(|l| !l.trim().is_empty()).nth(1))
        .ok_or_else(|| TierError::unparsable("memory", "no Mem: row"))?;

    let columns: Vec<&str> = row.split_whitespace().collect();
    if columns.len() < 4 {
        return Err(TierError::unparsable(
            "memory",
            format!("expected at least 4 columns, got {:?}", row),
        ));
    }
    let parse = |token: &str| {
        token.parse::<u64>().map_err(|_| {
            TierError::unparsable("memory", format!("expected an integer, got {:?}", token))
        })
    };
    let (total, used, free) = (parse(columns[1])?, parse(columns[2])?, parse(columns[3])?);
    MemoryStats::from_mebibytes(total, used, free)
        .ok_or_else(|| TierError::unparsable("memory", "total memory is zero"))
}

/// Size column in GiB. Plain numbers and a `G` suffix are GiB; K/M/T/P suffixes are scaled.
pub fn parse_size_gib(token: &str) -> Result<f64, TierError> {
    let token = token.trim();
    let (number, scale) = match token.chars().last() {
        Some('K') | Some('k') => (&token[..token.len() - 1], 1.0 / (1024.0 * 1024.0)),
        Some('M') => (&token[..token.len() - 1], 1.0 / 1024.0),
        Some('G') => (&token[..token.len() - 1], 1.0),
        Some('T') => (&token[..token.len() - 1], 1024.0),
        Some('P') => (&token[..token.len() - 1], 1024.0 * 1024.0),
        _ => (token, 1.0),
    };
    Ok(parse_number(number, "disk size")? * scale)
}

/// One df row: `device total used free percent [mount]`.
pub fn parse_disk_line(line: &str) -> Result<DiskStats, TierError> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() < 5 {
        return Err(TierError::unparsable(
            "disk",
            format!("expected at least 5 columns, got {:?}", line),
        ));
    }
    let percent = parse_number(columns[4].trim_end_matches('%'), "disk percent")?;
    Ok(DiskStats::new(
        columns[0],
        parse_size_gib(columns[1])?,
        parse_size_gib(columns[2])?,
        parse_size_gib(columns[3])?,
        percent,
    ))
}

/// All block-device filesystems in df output. Header, virtual and tmpfs rows are skipped;
/// a device listed twice keeps its first row. No block device at all is an error.
pub fn parse_disks(text: &str) -> Result<Vec<DiskStats>, TierError> {
    let mut disks: Vec<DiskStats> = Vec::new();
    for line in text
        .lines()
        .filter(|l| l.starts_with("/dev/") && !l.contains("tmpfs"))
    {
        let disk = parse_disk_line(line)?;
        if !disks.iter().any(|d| d.device == disk.device) {
            disks.push(disk);
        }
    }
    if disks.is_empty() {
        return Err(TierError::unparsable(
            "disks",
            "no /dev/ filesystems in df output",
        ));
    }
    Ok(disks)
}

/// Number of logical cores, from a count of `cpuN` lines. At most `MAX_CORE_COUNT`.
pub fn parse_core_count(text: &str) -> Result<usize, TierError> {
    let token = text.trim();
    let count = token.parse::<usize>().map_err(|_| {
        TierError::unparsable("core count", format!("expected an integer, got {:?}", token))
    })?;
    if count > MAX_CORE_COUNT {
        return Err(TierError::unparsable(
            "core count",
            format!("{} exceeds the limit of {}", count, MAX_CORE_COUNT),
        ));
    }
    Ok(count)
}

/// Approximate per-core usage: aggregate +/- `CORE_NOISE_SPREAD`, clamped to [0, 100].
pub fn synthesize_cores(usage: f64, count: usize, rng: &mut impl Rng) -> Vec<f64> {
    (0..count)
        .map(|_| {
            let noise = rng.random_range(-CORE_NOISE_SPREAD..=CORE_NOISE_SPREAD);
            clamp_percent(usage + noise)
        })
        .collect()
}

pub struct BuiltinCommandsTier {
    commands: BuiltinCommands,
    timeout: Duration,
    seed: Option<u64>,
}

impl BuiltinCommandsTier {
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_commands(config, BuiltinCommands::default())
    }

    pub fn with_commands(config: &MonitorConfig, commands: BuiltinCommands) -> Self {
        Self {
            commands,
            timeout: Duration::from_millis(config.command_timeout_ms),
            seed: config.random_seed,
        }
    }
}

#[async_trait]
impl StatsTier for BuiltinCommandsTier {
    fn name(&self) -> &'static str {
        "built-in"
    }

    #[instrument(skip(self), fields(tier = "built-in"))]
    async fn collect(&self) -> Result<StatsReport, TierError> {
        // Sequential: top samples a short window, so concurrent sub-queries would count as load.
        let usage = parse_cpu_usage(&run_command(&self.commands.cpu, self.timeout).await?)?;
        let memory = parse_memory(&run_command(&self.commands.memory, self.timeout).await?)?;
        let disks = parse_disks(&run_command(&self.commands.disks, self.timeout).await?)?;
        let core_count =
            parse_core_count(&run_command(&self.commands.core_count, self.timeout).await?)?;

        let mut rng = cycle_rng(self.seed);
        let cores = synthesize_cores(usage, core_count, &mut rng);
        Ok(StatsReport::new(
            CpuStats::new(usage, cores),
            memory,
            disks,
            StatsSource::BuiltIn,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_accepts_decimal_comma() {
        assert_eq!(parse_number("3,5", "x").unwrap(), 3.5);
    }

    #[test]
    fn size_suffixes_scale_to_gib() {
        assert_eq!(parse_size_gib("2048M").unwrap(), 2.0);
        assert_eq!(parse_size_gib("2T").unwrap(), 2048.0);
        assert_eq!(parse_size_gib("7").unwrap(), 7.0);
        assert!(parse_size_gib("G").is_err());
    }
}
