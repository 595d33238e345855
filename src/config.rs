//! Reliability tuning loaded from an optional TOML file, falling back to
//! sensible defaults when absent — the Raw/validated two-layer pattern
//! used throughout this codebase.

use battle_net::ReliabilityConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub reliability: ReliabilityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            reliability: ReliabilityConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    reliability: Option<RawReliabilityConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct RawReliabilityConfig {
    retry_interval_ms: Option<u64>,
    max_retries: Option<u32>,
    dedup_window: Option<usize>,
}

pub fn load(path: &Path) -> Result<EngineConfig, crate::error::BattleFailure> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let text = std::fs::read_to_string(path)?;
    let raw: RawConfig = toml::from_str(&text)
        .map_err(|e| crate::error::BattleFailure::new(crate::error::FailureKind::Io, e.to_string()))?;
    let defaults = ReliabilityConfig::default();
    let raw_reliability = raw.reliability.unwrap_or_default();
    Ok(EngineConfig {
        reliability: ReliabilityConfig {
            retry_interval: raw_reliability
                .retry_interval_ms
                .map_or(defaults.retry_interval, Duration::from_millis),
            max_retries: raw_reliability.max_retries.unwrap_or(defaults.max_retries),
            dedup_window: raw_reliability.dedup_window.unwrap_or(defaults.dedup_window),
        },
    })
}
