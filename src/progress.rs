//! Level progress and the score leaderboard, behind an injectable store.
//!
//! The session never reaches for a global: it is handed a [`ProgressStore`]
//! and calls it only when a game ends or the player exits.

use crate::error::ComboError;
use crate::state::Level;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "combo_board";
const FILENAME: &str = "progress.json";

/// What a finished level changed in the stored progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelResult {
    pub won: bool,
    /// Stars earned by this run (not the stored best).
    pub stars: u8,
    /// Level newly reachable because of this win, if any.
    pub unlocked: Option<u32>,
}

/// Everything persisted between sessions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub levels: Vec<Level>,
    /// Player scores, highest first.
    pub scores: Vec<u32>,
}

impl Default for Progress {
    fn default() -> Self {
        Progress {
            levels: Level::catalog(),
            scores: Vec::new(),
        }
    }
}

impl Progress {
    pub fn level(&self, number: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.number == number)
    }

    /// Looks up a level the player is allowed to start.
    pub fn playable_level(&self, number: u32) -> Result<&Level, ComboError> {
        let level = self
            .level(number)
            .ok_or(ComboError::UnknownLevel(number))?;
        if !level.is_unlocked {
            return Err(ComboError::LevelLocked(number));
        }
        Ok(level)
    }

    /// Applies a finished level. A win keeps the better of the stored and new
    /// star ratings and unlocks the next level in the list; a loss changes
    /// nothing.
    pub fn apply_level_result(
        &mut self,
        number: u32,
        score: u32,
    ) -> Result<LevelResult, ComboError> {
        let index = self
            .levels
            .iter()
            .position(|l| l.number == number)
            .ok_or(ComboError::UnknownLevel(number))?;

        let level = &mut self.levels[index];
        let won = score >= level.target_score;
        let stars = level.calculate_stars(score);
        if !won {
            return Ok(LevelResult {
                won,
                stars,
                unlocked: None,
            });
        }
        level.stars = level.stars.max(stars);

        let unlocked = match self.levels.get_mut(index + 1) {
            Some(next) if !next.is_unlocked => {
                next.is_unlocked = true;
                Some(next.number)
            }
            _ => None,
        };
        Ok(LevelResult {
            won,
            stars,
            unlocked,
        })
    }

    /// Inserts a score, keeping the list sorted highest first.
    pub fn add_score(&mut self, score: u32) {
        let at = self.scores.partition_point(|&s| s >= score);
        self.scores.insert(at, score);
    }

    pub fn best_score(&self) -> u32 {
        self.scores.first().copied().unwrap_or(0)
    }

    /// True if `score` would top the leaderboard. Call before [`add_score`].
    ///
    /// [`add_score`]: Progress::add_score
    pub fn is_high_score(&self, score: u32) -> bool {
        self.scores.first().map_or(true, |&best| score > best)
    }

    /// The best `n` scores.
    pub fn top_scores(&self, n: usize) -> &[u32] {
        &self.scores[..n.min(self.scores.len())]
    }
}

/// Persistence collaborator injected into a session.
pub trait ProgressStore {
    fn progress(&self) -> &Progress;

    /// Records a finished level (stars, unlocks). Called once per game over.
    fn record_level_result(
        &mut self,
        number: u32,
        score: u32,
    ) -> Result<LevelResult, ComboError>;

    /// Adds a score to the leaderboard.
    fn record_score(&mut self, score: u32) -> Result<(), ComboError>;
}

/// Keeps progress in memory only. Used by tests and the simulator.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    progress: Progress,
}

impl MemoryStore {
    pub fn new(progress: Progress) -> Self {
        MemoryStore { progress }
    }
}

impl ProgressStore for MemoryStore {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn record_level_result(
        &mut self,
        number: u32,
        score: u32,
    ) -> Result<LevelResult, ComboError> {
        self.progress.apply_level_result(number, score)
    }

    fn record_score(&mut self, score: u32) -> Result<(), ComboError> {
        self.progress.add_score(score);
        Ok(())
    }
}

/// Progress persisted as pretty-printed JSON, rewritten after every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    progress: Progress,
}

impl JsonFileStore {
    /// Default location: `$XDG_CONFIG_HOME/combo_board/progress.json`, or
    /// `~/.config/combo_board/progress.json` when that is unset or empty.
    pub fn default_path() -> PathBuf {
        let base = match std::env::var("XDG_CONFIG_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
            _ => std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".config"))
                .unwrap_or_else(|_| PathBuf::from(".")),
        };
        base.join(APP_DIR).join(FILENAME)
    }

    /// Opens the store at `path`. A missing file starts from the built-in
    /// catalog; an unreadable or malformed one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ComboError> {
        let path = path.into();
        let progress = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            debug!(path = %path.display(), "no saved progress, starting fresh");
            Progress::default()
        };
        Ok(JsonFileStore { path, progress })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current progress, creating the parent directory if needed.
    pub fn save(&self) -> Result<(), ComboError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.progress)?)?;
        Ok(())
    }
}

impl ProgressStore for JsonFileStore {
    fn progress(&self) -> &Progress {
        &self.progress
    }

    fn record_level_result(
        &mut self,
        number: u32,
        score: u32,
    ) -> Result<LevelResult, ComboError> {
        let result = self.progress.apply_level_result(number, score)?;
        if result.won {
            self.save()?;
        }
        Ok(result)
    }

    fn record_score(&mut self, score: u32) -> Result<(), ComboError> {
        self.progress.add_score(score);
        self.save()
    }
}
