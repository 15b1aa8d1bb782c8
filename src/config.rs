//! Station configuration (settings panel + timing constants)

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StationError};
use crate::types::{RecoverySymbol, RECOVERY_CODE_LEN};
use crate::{DEFAULT_DECAY_RATE, MAX_SANITY, POSSESSION_TIMEOUT_MS, TICK_INTERVAL_MS};

/// Tunables for one station session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub max_sanity: f64,
    /// Points per second
    pub decay_rate: f64,
    pub tick_interval_ms: u64,
    pub possession_timeout_ms: u64,
    pub recovery_code: Vec<RecoverySymbol>,
    /// Forward beeps and possession sounds to the effect sinks
    pub sound_enabled: bool,
    /// Write the message archive through to the store
    pub auto_save: bool,
    /// Directory for the JSON store; `None` keeps everything in memory
    pub stats_dir: Option<PathBuf>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            max_sanity: MAX_SANITY,
            decay_rate: DEFAULT_DECAY_RATE,
            tick_interval_ms: TICK_INTERVAL_MS,
            possession_timeout_ms: POSSESSION_TIMEOUT_MS,
            recovery_code: RecoverySymbol::default_code(),
            sound_enabled: true,
            auto_save: true,
            stats_dir: None,
        }
    }
}

impl StationConfig {
    /// Load from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StationError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| StationError::ConfigMalformed {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the engine meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.max_sanity > 0.0) || !self.max_sanity.is_finite() {
            return Err(StationError::InvalidMaxSanity(self.max_sanity));
        }
        if !(self.decay_rate > 0.0) || !self.decay_rate.is_finite() {
            return Err(StationError::InvalidDecayRate(self.decay_rate));
        }
        if self.tick_interval_ms == 0 {
            return Err(StationError::InvalidDuration("tick_interval_ms"));
        }
        if self.possession_timeout_ms == 0 {
            return Err(StationError::InvalidDuration("possession_timeout_ms"));
        }
        if self.recovery_code.len() != RECOVERY_CODE_LEN {
            return Err(StationError::InvalidRecoveryCode {
                expected: RECOVERY_CODE_LEN,
                actual: self.recovery_code.len(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn possession_timeout(&self) -> Duration {
        Duration::from_millis(self.possession_timeout_ms)
    }
}
