//! Coordinator configuration and layered settings loading.
//!
//! Settings merge like the rest of the workspace: system defaults, then user
//! overrides, then environment. Any value that is missing or zero falls back
//! to the built-in default.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::BatchError;

/// Default maximum number of jobs per dispatched batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Default maximum wait, in milliseconds, before a partial batch is flushed.
pub const DEFAULT_BATCH_FREQUENCY_MS: u64 = 1000;

const ENV_BATCH_SIZE: &str = "OMNI_BATCH_SIZE";
const ENV_BATCH_FREQUENCY_MS: &str = "OMNI_BATCH_FREQUENCY_MS";

/// Immutable coordinator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum jobs per dispatched batch.
    pub batch_size: usize,
    /// Maximum wait before a non-full batch is flushed.
    pub batch_frequency: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_frequency: Duration::from_millis(DEFAULT_BATCH_FREQUENCY_MS),
        }
    }
}

impl BatchConfig {
    /// Build a config; `None` or zero selects the default for that field.
    #[must_use]
    pub fn new(batch_size: Option<usize>, batch_frequency_ms: Option<u64>) -> Self {
        Self::default()
            .with_batch_size(batch_size.unwrap_or(0))
            .with_batch_frequency(Duration::from_millis(batch_frequency_ms.unwrap_or(0)))
    }

    /// Override the batch size. Zero keeps the default.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        self
    }

    /// Override the flush window. A zero duration keeps the default.
    #[must_use]
    pub fn with_batch_frequency(mut self, batch_frequency: Duration) -> Self {
        self.batch_frequency = if batch_frequency.is_zero() {
            Duration::from_millis(DEFAULT_BATCH_FREQUENCY_MS)
        } else {
            batch_frequency
        };
        self
    }
}

/// Optional settings as read from YAML or the environment.
///
/// ```yaml
/// batch_size: 32
/// batch_frequency_ms: 250
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchSettings {
    /// Maximum jobs per batch.
    pub batch_size: Option<usize>,
    /// Flush window in milliseconds.
    pub batch_frequency_ms: Option<u64>,
}

impl BatchSettings {
    /// Parse settings from a YAML document. An empty document yields defaults.
    ///
    /// # Errors
    /// Returns `BatchError::Config` if the document is not valid settings YAML.
    pub fn from_yaml_str(raw: &str) -> Result<Self, BatchError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|error| BatchError::Config(error.to_string()))
    }

    /// Read and parse a settings file.
    ///
    /// # Errors
    /// Returns `BatchError::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|error| BatchError::Config(format!("{}: {error}", path.display())))?;
        Self::from_yaml_str(&raw)
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            batch_size: overrides.batch_size.or(self.batch_size),
            batch_frequency_ms: overrides.batch_frequency_ms.or(self.batch_frequency_ms),
        }
    }

    /// Apply `OMNI_BATCH_SIZE` / `OMNI_BATCH_FREQUENCY_MS` through `lookup`.
    ///
    /// Pass `|key| std::env::var(key).ok()` to read the process environment.
    /// Unparsable values are logged and ignored.
    #[must_use]
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = parse_env_value::<usize, _>(&lookup, ENV_BATCH_SIZE) {
            self.batch_size = Some(value);
        }
        if let Some(value) = parse_env_value::<u64, _>(&lookup, ENV_BATCH_FREQUENCY_MS) {
            self.batch_frequency_ms = Some(value);
        }
        self
    }

    /// Resolve into a coordinator config.
    #[must_use]
    pub fn into_config(self) -> BatchConfig {
        BatchConfig::new(self.batch_size, self.batch_frequency_ms)
    }
}

fn parse_env_value<V, F>(lookup: &F, key: &str) -> Option<V>
where
    V: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<V>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %trimmed, "ignoring invalid batch setting override");
            None
        }
    }
}
