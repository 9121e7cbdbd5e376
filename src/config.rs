//! Engine configuration.
//!
//! Values come from defaults, optionally overridden by a JSON file, and finally
//! by command-line flags in the binaries.

use crate::engine::{DEFAULT_COLS, DEFAULT_ROWS};
use crate::error::ComboError;
use crate::matcher::MIN_RUN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Randomized shuffle attempts before falling back to constructive seeding.
pub const DEFAULT_SHUFFLE_ATTEMPTS: u32 = 100;
/// Runs planted by constructive seeding.
pub const DEFAULT_SEEDED_RUNS: u32 = 5;
/// Idle time after which a stuck input lock is released.
pub const DEFAULT_WATCHDOG_MS: u64 = 250;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub rows: usize,
    pub cols: usize,
    pub shuffle_attempts: u32,
    pub seeded_runs: u32,
    pub watchdog_ms: u64,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            shuffle_attempts: DEFAULT_SHUFFLE_ATTEMPTS,
            seeded_runs: DEFAULT_SEEDED_RUNS,
            watchdog_ms: DEFAULT_WATCHDOG_MS,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ComboError> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the board can hold a run in both directions and that the
    /// shuffle can both permute and plant.
    pub fn validate(&self) -> Result<(), ComboError> {
        if self.rows < MIN_RUN || self.cols < MIN_RUN {
            return Err(ComboError::InvalidConfig(format!(
                "board must be at least {}x{}, got {}x{}",
                MIN_RUN, MIN_RUN, self.rows, self.cols
            )));
        }
        if self.shuffle_attempts == 0 {
            return Err(ComboError::InvalidConfig(
                "shuffle_attempts must be at least 1".to_string(),
            ));
        }
        if self.seeded_runs == 0 {
            return Err(ComboError::InvalidConfig(
                "seeded_runs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
