//! # Combo Board Library
//!
//! This library provides the board resolution engine for a letter-tile
//! match-3 puzzle: swap two neighbouring tiles, clear every horizontal or
//! vertical run of three or more equal letters, refill the cleared cells and
//! keep resolving while new runs appear, all under a move budget and a combo
//! multiplier.
//!
//! It is used by three binaries:
//! - `combo_player`: Interactive play on the command line through a `Session`.
//! - `hint_finder`: Loads a board file and prints the hint, or reshuffles the
//!   board when it has no legal move.
//! - `level_simulator`: Autoplays every built-in level with each strategy in
//!   `heuristics` and reports win rates.
//!
//! ## Modules
//! - `engine`: Tile identities, coordinates and the `Board` grid.
//! - `matcher`: Run detection (`find_matches`, `find_runs`).
//! - `state`: Score, combo and move accounting (`GameState`), levels and modes.
//! - `solver`: Hints, the solvability probe and the always-solvable shuffle.
//! - `resolver`: The `ResolutionEngine` state machine and its `GameEvent`s.
//! - `session`: Input locking, animation tracking, queued requests and
//!   reporting to a `ProgressStore`.
//! - `progress`: Level progress and leaderboard persistence.
//! - `config`: `EngineConfig`, loadable from JSON.
//! - `heuristics`: Move-selection strategies for automated play.
//! - `error`: `ComboError` and `SwapRejection`.
//! - `utils`: Board parsing and log setup.

pub mod config;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod matcher;
pub mod progress;
pub mod resolver;
pub mod session;
pub mod solver;
pub mod state;
pub mod utils;
