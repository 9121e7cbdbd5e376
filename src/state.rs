//! Score, combo and move-budget bookkeeping, plus the level descriptors that
//! seed it.

use serde::{Deserialize, Serialize};

/// Points awarded per matched tile before any multiplier.
pub const POINTS_PER_TILE: u32 = 100;
/// Highest combo multiplier reachable.
pub const MAX_COMBO: u32 = 5;
/// Target score of the endless pseudo-level.
pub const ENDLESS_TARGET_SCORE: u32 = 99_999;

/// A level descriptor.
///
/// Only `stars` and `is_unlocked` ever change, and only through the progress
/// store after a session ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub number: u32,
    pub target_score: u32,
    pub moves_limit: u32,
    pub objectives: Vec<String>,
    pub min_word_length: u32,
    pub stars: u8,
    pub is_unlocked: bool,
}

impl Level {
    fn built_in(
        number: u32,
        target_score: u32,
        moves_limit: u32,
        objectives: &[&str],
        min_word_length: u32,
    ) -> Self {
        Level {
            number,
            target_score,
            moves_limit,
            objectives: objectives.iter().map(|s| s.to_string()).collect(),
            min_word_length,
            stars: 0,
            is_unlocked: number == 1,
        }
    }

    /// The ten built-in levels. Only level 1 starts unlocked.
    pub fn catalog() -> Vec<Level> {
        vec![
            Level::built_in(1, 1000, 20, &["Score 1000 points"], 3),
            Level::built_in(2, 1500, 18, &["Score 1500 points", "Form 3 words of 5+ letters"], 3),
            Level::built_in(3, 2000, 15, &["Score 2000 points", "Form 10 words"], 4),
            Level::built_in(4, 2500, 20, &["Score 2500 points"], 3),
            Level::built_in(5, 3000, 15, &["Score 3000 points", "Form 5 words of 6+ letters"], 4),
            Level::built_in(6, 3500, 12, &["Score 3500 points"], 4),
            Level::built_in(7, 4000, 18, &["Score 4000 points", "Form 15 words"], 3),
            Level::built_in(8, 4500, 10, &["Score 4500 points"], 4),
            Level::built_in(9, 5000, 15, &["Score 5000 points", "Form 7 words of 6+ letters"], 4),
            Level::built_in(10, 6000, 20, &["Score 6000 points", "Form 20 words"], 3),
        ]
    }

    /// Star rating for a final score: 3 at twice the target, 2 at one and a
    /// half times (rounded down), 1 at the target, otherwise 0.
    pub fn calculate_stars(&self, score: u32) -> u8 {
        let target = u64::from(self.target_score);
        let score = u64::from(score);
        if score >= target * 2 {
            3
        } else if score >= target * 3 / 2 {
            2
        } else if score >= target {
            1
        } else {
            0
        }
    }
}

/// What kind of session is being played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameMode {
    /// Finite moves, scored against the level's target.
    Level(Level),
    /// Unlimited moves; ends only when the player exits.
    Endless,
}

impl GameMode {
    pub fn is_endless(&self) -> bool {
        matches!(self, GameMode::Endless)
    }
}

/// Terminal result of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOver {
    pub won: bool,
    pub score: u32,
    /// Always empty: word formation is not tracked.
    pub longest_word: String,
}

/// Mutable per-session bookkeeping, written only by the resolution engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    score: u32,
    moves_remaining: Option<u32>,
    moves_made: u32,
    combo_multiplier: u32,
    level_number: u32,
    target_score: u32,
    moves_limit: Option<u32>,
    longest_word: String,
}

impl GameState {
    /// Fresh state for a level: score 0, combo 1, full move budget.
    pub fn for_level(level: &Level) -> Self {
        GameState {
            score: 0,
            moves_remaining: Some(level.moves_limit),
            moves_made: 0,
            combo_multiplier: 1,
            level_number: level.number,
            target_score: level.target_score,
            moves_limit: Some(level.moves_limit),
            longest_word: String::new(),
        }
    }

    /// Fresh state for endless play: level 0 with an unlimited move budget.
    pub fn endless() -> Self {
        GameState {
            score: 0,
            moves_remaining: None,
            moves_made: 0,
            combo_multiplier: 1,
            level_number: 0,
            target_score: ENDLESS_TARGET_SCORE,
            moves_limit: None,
            longest_word: String::new(),
        }
    }

    pub fn for_mode(mode: &GameMode) -> Self {
        match mode {
            GameMode::Level(level) => GameState::for_level(level),
            GameMode::Endless => GameState::endless(),
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Remaining moves, or `None` when the budget is unlimited.
    pub fn moves_remaining(&self) -> Option<u32> {
        self.moves_remaining
    }

    /// Number of move-consuming swaps played so far.
    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn combo_multiplier(&self) -> u32 {
        self.combo_multiplier
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    pub fn target_score(&self) -> u32 {
        self.target_score
    }

    pub fn moves_limit(&self) -> Option<u32> {
        self.moves_limit
    }

    pub fn longest_word(&self) -> &str {
        &self.longest_word
    }

    /// Adds `points × combo_multiplier` to the score and returns the amount added.
    ///
    /// Callers pass points that already include the multiplier once, so the
    /// multiplier ends up applied twice. Kept as-is; tests pin the resulting
    /// growth.
    pub fn add_score(&mut self, points: u32) -> u32 {
        let gained = points.saturating_mul(self.combo_multiplier);
        self.score = self.score.saturating_add(gained);
        gained
    }

    pub fn increment_combo(&mut self) {
        self.combo_multiplier = (self.combo_multiplier + 1).min(MAX_COMBO);
    }

    pub fn reset_combo(&mut self) {
        self.combo_multiplier = 1;
    }

    /// Charges one move. Unlimited budgets only count it.
    pub fn consume_move(&mut self) {
        self.moves_made += 1;
        if let Some(remaining) = self.moves_remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// True once a limited budget has been spent.
    pub fn out_of_moves(&self) -> bool {
        self.moves_remaining == Some(0)
    }

    pub fn has_won(&self) -> bool {
        self.score >= self.target_score
    }

    /// Snapshot of the result at this point.
    pub fn game_over(&self, won: bool) -> GameOver {
        GameOver {
            won,
            score: self.score,
            longest_word: self.longest_word.clone(),
        }
    }
}
