// Tier failure taxonomy

use thiserror::Error;

/// Why a tier could not produce a report. Every variant means "fall through to the next tier".
#[derive(Debug, Error)]
pub enum TierError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("unparsable {what}: {detail}")]
    Unparsable { what: &'static str, detail: String },
}

impl TierError {
    pub(crate) fn unparsable(what: &'static str, detail: impl Into<String>) -> Self {
        TierError::Unparsable {
            what,
            detail: detail.into(),
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "signal".to_string(),
    }
}

/// Returned by `collect()` only when every tier failed, synthetic included.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("all {attempts} stats tiers failed")]
    Exhausted { attempts: usize },
}
