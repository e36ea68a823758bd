//! Runtime configuration from environment variables.
//!
//! Every variable is optional. Unparseable values are errors, never panics.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bridge_core::logistics::SimulationConfig;

use crate::advisory::gemini::{API_KEY_VAR, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::advisory::ModelConfig;
use crate::error::ConfigError;

pub const DATA_DIR_VAR: &str = "BLOOD_BRIDGE_DATA_DIR";
pub const DISPATCH_SECS_VAR: &str = "BLOOD_BRIDGE_DISPATCH_SECS";
pub const ADVANCE_SECS_VAR: &str = "BLOOD_BRIDGE_ADVANCE_SECS";
pub const MAX_IN_TRANSIT_VAR: &str = "BLOOD_BRIDGE_MAX_IN_TRANSIT";
pub const SEED_VAR: &str = "BLOOD_BRIDGE_SEED";
pub const MODEL_VAR: &str = "BLOOD_BRIDGE_MODEL";
pub const MODEL_ENDPOINT_VAR: &str = "BLOOD_BRIDGE_MODEL_ENDPOINT";
pub const MODEL_RETRIES_VAR: &str = "BLOOD_BRIDGE_MODEL_RETRIES";
pub const RUN_SECS_VAR: &str = "BLOOD_BRIDGE_RUN_SECS";

const DEFAULT_RUN_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Slot directory. `None` keeps the session in memory.
    pub data_dir: Option<PathBuf>,
    pub simulation: SimulationConfig,
    /// Fixed RNG seed for reproducible dispatch.
    pub seed: Option<u64>,
    pub model: ModelConfig,
    pub run_time: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            simulation: SimulationConfig::default(),
            seed: None,
            model: ModelConfig::default(),
            run_time: Duration::from_secs(DEFAULT_RUN_SECS),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.data_dir = get(DATA_DIR_VAR).map(PathBuf::from);

        if let Some(v) = get(DISPATCH_SECS_VAR) {
            config.simulation.dispatch_interval = parse_secs(DISPATCH_SECS_VAR, &v)?;
        }
        if let Some(v) = get(ADVANCE_SECS_VAR) {
            config.simulation.advance_interval = parse_secs(ADVANCE_SECS_VAR, &v)?;
        }
        if let Some(v) = get(MAX_IN_TRANSIT_VAR) {
            let n: usize = parse(MAX_IN_TRANSIT_VAR, &v)?;
            if n == 0 {
                return Err(invalid(MAX_IN_TRANSIT_VAR, &v, "must be at least 1"));
            }
            config.simulation.max_in_transit = n;
        }
        if let Some(v) = get(SEED_VAR) {
            config.seed = Some(parse(SEED_VAR, &v)?);
        }

        config.model.api_key = get(API_KEY_VAR);
        config.model.model = get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        config.model.endpoint = get(MODEL_ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        if let Some(v) = get(MODEL_RETRIES_VAR) {
            config.model.retries = parse(MODEL_RETRIES_VAR, &v)?;
        }

        if let Some(v) = get(RUN_SECS_VAR) {
            config.run_time = parse_secs(RUN_SECS_VAR, &v)?;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| invalid(key, value, e.to_string()))
}

/// Positive, possibly fractional, seconds.
fn parse_secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let secs: f64 = parse(key, value)?;
    if !(secs > 0.0) {
        return Err(invalid(key, value, "must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(key, value, e.to_string()))
}
