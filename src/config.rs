//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - ruleengine.toml (default configuration)
//! - ruleengine.local.toml (git-ignored local overrides)
//! - Environment variables (RULEENGINE_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # ruleengine.toml
//! [truncation]
//! policy = "log"
//!
//! [gate]
//! min_score_rounding = "ceil"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! RULEENGINE_TRUNCATION__POLICY=reject
//! RULEENGINE_GATE__MIN_SCORE_ROUNDING=ceil
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub truncation: TruncationConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How [`crate::product::Product::set`] should behave when a value exceeds
/// an attribute's `max_length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Truncate silently (the `Product` default).
    Silent,
    /// Truncate and emit a `tracing::warn!` event.
    Log,
    /// Treat an over-length value as an `EngineError::Input`.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruncationConfig {
    #[serde(default = "default_truncation_policy")]
    pub policy: TruncationPolicy,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        TruncationConfig { policy: default_truncation_policy() }
    }
}

fn default_truncation_policy() -> TruncationPolicy {
    TruncationPolicy::Silent
}

/// How [`crate::gate::TransactionGate`] rounds its default `min_score` when
/// the owner count is odd. The gate's built-in default is `floor(n/2)`; a
/// deployment that wants the stricter "more than half" reading sets this to
/// `ceil` and calls `set_min_score` explicitly from the rounded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinScoreRounding {
    Floor,
    Ceil,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_min_score_rounding")]
    pub min_score_rounding: MinScoreRounding,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig { min_score_rounding: default_min_score_rounding() }
    }
}

fn default_min_score_rounding() -> MinScoreRounding {
    MinScoreRounding::Floor
}

impl MinScoreRounding {
    /// Round `owner_count / 2` per this policy.
    pub fn round(self, owner_count: u32) -> u32 {
        match self {
            MinScoreRounding::Floor => owner_count / 2,
            MinScoreRounding::Ceil => owner_count.div_ceil(2),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl EngineConfig {
    /// Load configuration from default locations.
    ///
    /// Merges in order:
    /// 1. `ruleengine.toml` (base configuration)
    /// 2. `ruleengine.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`RULEENGINE_*` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("ruleengine.toml"))
            .merge(Toml::file("ruleengine.local.toml"))
            .merge(Env::prefixed("RULEENGINE_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("RULEENGINE_").split("__"))
            .extract()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            truncation: TruncationConfig::default(),
            gate: GateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
