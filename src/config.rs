use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

fn default_port() -> u16 {
    8081
}

fn default_host() -> String {
    "0.0.0.0".into()
}

/// Custom monitor location and per-command limits, handed to the collector at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Directory holding the custom monitor executable.
    #[serde(default = "default_monitor_path")]
    pub path: String,
    /// Executable name inside `path`.
    #[serde(default = "default_monitor_command")]
    pub command: String,
    /// Applies to every external invocation, custom and built-in.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Fixed seed for synthesized values (tests, demos). OS entropy when unset.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            path: default_monitor_path(),
            command: default_monitor_command(),
            command_timeout_ms: default_command_timeout_ms(),
            random_seed: None,
        }
    }
}

fn default_monitor_path() -> String {
    ".".into()
}

fn default_monitor_command() -> String {
    "system_monitor".into()
}

fn default_command_timeout_ms() -> u64 {
    2000
}

impl MonitorConfig {
    /// `path/command` with runs of `/` collapsed to one.
    pub fn command_path(&self) -> PathBuf {
        let joined = format!("{}/{}", self.path, self.command);
        let mut collapsed = String::with_capacity(joined.len());
        for c in joined.chars() {
            if c == '/' && collapsed.ends_with('/') {
                continue;
            }
            collapsed.push(c);
        }
        PathBuf::from(collapsed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Interval between reports pushed on /ws/stats.
    #[serde(default = "default_stats_frequency_ms")]
    pub stats_frequency_ms: u64,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            stats_frequency_ms: default_stats_frequency_ms(),
        }
    }
}

fn default_stats_frequency_ms() -> u64 {
    2000
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (or `config.toml`), then applies environment overrides.
    /// A missing default `config.toml` falls back to built-in defaults; a missing explicit file is an error.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)?;
                toml::from_str(&s)?
            }
            Err(_) => match std::fs::read_to_string("config.toml") {
                Ok(s) => toml::from_str(&s)?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
                Err(e) => return Err(e.into()),
            },
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides monitor settings from `SYSTEM_MONITOR_PATH`, `SYSTEM_MONITOR_COMMAND` and `STATS_RANDOM_SEED`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SYSTEM_MONITOR_PATH") {
            self.monitor.path = path;
        }
        if let Some(command) = lookup("SYSTEM_MONITOR_COMMAND") {
            self.monitor.command = command;
        }
        if let Some(seed) = lookup("STATS_RANDOM_SEED") {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("STATS_RANDOM_SEED must be a u64: {}", e))?;
            self.monitor.random_seed = Some(seed);
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(!self.server.host.is_empty(), "server.host must be non-empty");
        anyhow::ensure!(
            !self.monitor.path.is_empty(),
            "monitor.path must be non-empty"
        );
        anyhow::ensure!(
            !self.monitor.command.is_empty(),
            "monitor.command must be non-empty"
        );
        anyhow::ensure!(
            self.monitor.command_timeout_ms > 0,
            "monitor.command_timeout_ms must be > 0, got {}",
            self.monitor.command_timeout_ms
        );
        anyhow::ensure!(
            self.publishing.stats_frequency_ms > 0,
            "publishing.stats_frequency_ms must be > 0, got {}",
            self.publishing.stats_frequency_ms
        );
        Ok(())
    }
}
