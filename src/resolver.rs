//! The resolution engine: owns the board and game state and drives a swap
//! through match, removal, refill and cascade.
//!
//! Phases:
//! - `Idle`: accepts swaps, hints and shuffles.
//! - `Busy`: a swap is being validated and applied.
//! - `Cascading`: the board was refilled and is being re-checked for matches.
//! - `Finished`: the game is over; every further swap is rejected.
//!
//! All calls run to completion, so callers only ever observe `Idle` or
//! `Finished` from the outside. Everything presentation needs to animate is
//! queued as [`GameEvent`]s and collected with [`ResolutionEngine::drain_events`].

use crate::config::EngineConfig;
use crate::engine::{generate_random_letter, Board, Coord, Tile};
use crate::error::{ComboError, SwapRejection};
use crate::matcher::{find_matches, MatchSet};
use crate::solver::{self, ShuffleOutcome};
use crate::state::{GameMode, GameOver, GameState, POINTS_PER_TILE};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument, warn};

/// Times a whole shuffle (permute, then auto-resolve) is repeated before a
/// near-run is planted on the resolved board instead.
const MAX_SHUFFLE_ROUNDS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Busy,
    Cascading,
    Finished,
}

/// Notifications for the presentation layer, in the order things happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// New total score.
    ScoreChanged(u32),
    /// New remaining move count. Only limited budgets report this.
    MovesChanged(u32),
    /// One scored cascade round. `points` is what was added to the score.
    /// `silent` rounds come from auto-resolve and get no match effects.
    Matched {
        tiles: Vec<Tile>,
        points: u32,
        combo: u32,
        silent: bool,
    },
    TileMoved {
        tile: Tile,
        from: Coord,
        to: Coord,
    },
    TileRemoved(Tile),
    TileCreated(Tile),
    /// A tile kept its identity but received a new letter during a shuffle.
    TileRelettered(Tile),
    SwapReverted {
        a: Coord,
        b: Coord,
    },
    HintFound(Coord, Coord),
    Shuffled {
        seeded: bool,
    },
    GameOver(GameOver),
    /// Input was locked (`false`) or released (`true`).
    ControlsEnabled(bool),
    /// The exiting score tops the leaderboard.
    NewHighScore(u32),
}

/// Totals for one accepted swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Scored rounds, the triggering match included.
    pub rounds: u32,
    pub tiles_cleared: usize,
    pub points: u32,
    /// Set when this swap spent the last move.
    pub game_over: Option<GameOver>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Nothing changed.
    Rejected(SwapRejection),
    /// The swap produced no match and was undone. Score and moves are unchanged.
    Reverted,
    Resolved(Resolution),
}

impl SwapOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SwapOutcome::Rejected(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scoring {
    /// Player swap: combo, score and one move.
    Move,
    /// Auto-resolve at start: combo and score, no move.
    Free,
    /// Auto-resolve after a shuffle: tiles are cleared and refilled, nothing
    /// is counted.
    Uncounted,
}

#[derive(Debug)]
pub struct ResolutionEngine {
    board: Board,
    state: GameState,
    mode: GameMode,
    config: EngineConfig,
    rng: SmallRng,
    phase: EnginePhase,
    events: Vec<GameEvent>,
    game_over: Option<GameOver>,
    /// Letters handed to refills before the RNG is consulted.
    #[cfg(test)]
    refill_script: std::collections::VecDeque<char>,
}

fn rng_for(config: &EngineConfig) -> SmallRng {
    match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

impl ResolutionEngine {
    /// Creates an engine with a freshly generated board for `mode`, already
    /// auto-resolved so play starts without matches.
    pub fn new(mode: GameMode, config: EngineConfig) -> Result<Self, ComboError> {
        config.validate()?;
        let mut rng = rng_for(&config);
        let board = Board::new_random(config.rows, config.cols, &mut rng);
        let mut engine = ResolutionEngine::assemble(board, mode, config, rng);
        engine.auto_resolve();
        Ok(engine)
    }

    /// Creates an engine around an existing board, taken as is: no
    /// auto-resolve runs, so any matches on it wait for the first swap.
    pub fn with_board(board: Board, mode: GameMode, config: EngineConfig) -> Self {
        let rng = rng_for(&config);
        ResolutionEngine::assemble(board, mode, config, rng)
    }

    fn assemble(board: Board, mode: GameMode, config: EngineConfig, rng: SmallRng) -> Self {
        ResolutionEngine {
            board,
            state: GameState::for_mode(&mode),
            mode,
            config,
            rng,
            phase: EnginePhase::Idle,
            events: Vec::new(),
            game_over: None,
            #[cfg(test)]
            refill_script: Default::default(),
        }
    }

    /// Starts over in `mode`: new board, fresh state, empty event queue, then
    /// an auto-resolve.
    #[instrument(level = "debug", skip(self))]
    pub fn initialize(&mut self, mode: GameMode) {
        self.board = Board::new_random(self.config.rows, self.config.cols, &mut self.rng);
        self.state = GameState::for_mode(&mode);
        self.mode = mode;
        self.phase = EnginePhase::Idle;
        self.events.clear();
        self.game_over = None;
        self.auto_resolve();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == EnginePhase::Finished
    }

    pub fn game_over(&self) -> Option<&GameOver> {
        self.game_over.as_ref()
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Validates and plays a player swap.
    ///
    /// The swap is applied to the model first. If it forms no match it is
    /// swapped back, the combo resets, and [`SwapOutcome::Reverted`] is
    /// returned with score and moves untouched. Otherwise the match is scored
    /// and cleared, exactly one move is charged, and cascades resolve
    /// without further move cost.
    ///
    /// # Returns
    /// * `SwapOutcome::Rejected` when the game is over, the engine is not idle,
    ///   a coordinate is off the board, or the tiles are not neighbours. The
    ///   board and state are unchanged in that case.
    #[instrument(level = "debug", skip(self))]
    pub fn request_swap(&mut self, a: Coord, b: Coord) -> SwapOutcome {
        match self.phase {
            EnginePhase::Finished => return SwapOutcome::Rejected(SwapRejection::GameOver),
            EnginePhase::Idle => {}
            EnginePhase::Busy | EnginePhase::Cascading => {
                return SwapOutcome::Rejected(SwapRejection::Busy)
            }
        }
        let (Some(tile_a), Some(tile_b)) = (self.board.get(a), self.board.get(b)) else {
            return SwapOutcome::Rejected(SwapRejection::OutOfBounds);
        };
        if !self.board.is_adjacent(&tile_a, &tile_b) {
            return SwapOutcome::Rejected(SwapRejection::NotAdjacent);
        }

        self.phase = EnginePhase::Busy;
        self.swap_with_events(a, b);

        let matches = find_matches(&self.board);
        if matches.is_empty() {
            self.swap_with_events(a, b);
            self.emit(GameEvent::SwapReverted { a, b });
            self.state.reset_combo();
            self.phase = EnginePhase::Idle;
            debug!("no match, swap reverted");
            return SwapOutcome::Reverted;
        }

        let (rounds, tiles_cleared, points) = self.resolve_cascade(matches, Scoring::Move);
        let game_over = self.check_game_over();
        SwapOutcome::Resolved(Resolution {
            rounds,
            tiles_cleared,
            points,
            game_over,
        })
    }

    fn swap_with_events(&mut self, a: Coord, b: Coord) {
        self.board.swap(a, b);
        for (to, from) in [(a, b), (b, a)] {
            if let Some(tile) = self.board.get(to) {
                self.emit(GameEvent::TileMoved { tile, from, to });
            }
        }
    }

    // Clears `matches`, refills, and repeats while new matches appear.
    // Returns (rounds, tiles cleared, points added).
    fn resolve_cascade(&mut self, mut matches: MatchSet, scoring: Scoring) -> (u32, usize, u32) {
        let mut rounds = 0;
        let mut cleared = 0;
        let mut total_points = 0;

        while !matches.is_empty() {
            rounds += 1;
            cleared += matches.len();

            if scoring != Scoring::Uncounted {
                self.state.increment_combo();
                let combo = self.state.combo_multiplier();
                let points = (matches.len() as u32)
                    .saturating_mul(POINTS_PER_TILE)
                    .saturating_mul(combo);
                let gained = self.state.add_score(points);
                total_points += gained;
                self.emit(GameEvent::Matched {
                    tiles: matches.tiles().to_vec(),
                    points: gained,
                    combo,
                    silent: scoring == Scoring::Free,
                });
                self.emit(GameEvent::ScoreChanged(self.state.score()));
                debug!(round = rounds, tiles = matches.len(), combo, gained, "cascade round");
            } else {
                debug!(round = rounds, tiles = matches.len(), "uncounted round");
            }

            for &tile in matches.tiles() {
                self.emit(GameEvent::TileRemoved(tile));
            }

            if scoring == Scoring::Move && rounds == 1 {
                self.state.consume_move();
                if let Some(remaining) = self.state.moves_remaining() {
                    self.emit(GameEvent::MovesChanged(remaining));
                }
            }

            self.refill(&matches);
            self.phase = EnginePhase::Cascading;
            matches = find_matches(&self.board);
        }

        if scoring != Scoring::Uncounted {
            self.state.reset_combo();
        }
        self.phase = EnginePhase::Idle;
        (rounds, cleared, total_points)
    }

    fn refill(&mut self, cleared: &MatchSet) {
        for coord in cleared.coords() {
            let letter = self.next_refill_letter();
            let fresh = self.board.new_tile(letter);
            self.board.replace(coord, fresh);
            if let Some(placed) = self.board.get(coord) {
                self.emit(GameEvent::TileCreated(placed));
            }
        }
    }

    #[cfg(not(test))]
    fn next_refill_letter(&mut self) -> char {
        generate_random_letter(&mut self.rng)
    }

    #[cfg(test)]
    fn next_refill_letter(&mut self) -> char {
        match self.refill_script.pop_front() {
            Some(letter) => letter,
            None => generate_random_letter(&mut self.rng),
        }
    }

    /// Clears every match currently on the board. Rounds climb the combo and
    /// score like a cascade, but no move is charged and `Matched` events are
    /// flagged `silent`. The combo is back at 1 afterwards. Returns the number
    /// of rounds it took. Does nothing once the game is over.
    pub fn auto_resolve(&mut self) -> u32 {
        self.resolve_in_place(Scoring::Free)
    }

    fn resolve_in_place(&mut self, scoring: Scoring) -> u32 {
        if self.is_finished() {
            return 0;
        }
        let matches = find_matches(&self.board);
        let (rounds, cleared, points) = self.resolve_cascade(matches, scoring);
        if rounds > 0 {
            debug!(rounds, cleared, points, "auto-resolved board");
        }
        rounds
    }

    fn check_game_over(&mut self) -> Option<GameOver> {
        if self.mode.is_endless() || !self.state.out_of_moves() {
            return None;
        }
        let won = self.state.has_won();
        Some(self.finish(won))
    }

    fn finish(&mut self, won: bool) -> GameOver {
        let over = self.state.game_over(won);
        info!(won, score = over.score, level = self.state.level_number(), "game over");
        self.phase = EnginePhase::Finished;
        self.game_over = Some(over.clone());
        self.emit(GameEvent::GameOver(over.clone()));
        over
    }

    /// Ends the game on the player's request.
    ///
    /// Endless play finishes as a loss and reports it. A level left early is
    /// abandoned: the engine stops but there is no result to report. Returns
    /// `None` if the game was already over.
    pub fn end(&mut self) -> Option<GameOver> {
        if self.is_finished() {
            return None;
        }
        if self.mode.is_endless() {
            Some(self.finish(false))
        } else {
            debug!("level abandoned");
            self.phase = EnginePhase::Finished;
            None
        }
    }

    /// Returns the first pair of tiles whose swap would match and queues a
    /// [`GameEvent::HintFound`] for it.
    pub fn hint(&mut self) -> Option<(Tile, Tile)> {
        if self.is_finished() {
            return None;
        }
        let (a, b) = solver::find_hint(&self.board)?;
        self.emit(GameEvent::HintFound(a.coord(), b.coord()));
        Some((a, b))
    }

    pub fn has_any_legal_move(&self) -> bool {
        solver::has_any_legal_move(&self.board)
    }

    /// Rearranges the letters so at least one legal move exists, then clears
    /// any runs that produced. Never costs a move and never scores.
    ///
    /// Returns `None` when the engine is not idle.
    #[instrument(level = "debug", skip(self))]
    pub fn shuffle(&mut self) -> Option<ShuffleOutcome> {
        if self.phase != EnginePhase::Idle {
            return None;
        }
        self.state.reset_combo();

        let mut round = 0;
        let outcome = loop {
            round += 1;
            let outcome = solver::shuffle_board(
                &mut self.board,
                &mut self.rng,
                self.config.shuffle_attempts,
                self.config.seeded_runs,
            );
            self.emit_reletters();
            self.resolve_in_place(Scoring::Uncounted);
            if solver::has_any_legal_move(&self.board) {
                break outcome;
            }
            if round >= MAX_SHUFFLE_ROUNDS {
                warn!(round, "auto-resolve keeps removing every move, planting a near-run");
                self.plant_last_resort();
                self.emit_reletters();
                break ShuffleOutcome {
                    attempts: outcome.attempts,
                    seeded: true,
                };
            }
        };

        info!(attempts = outcome.attempts, seeded = outcome.seeded, "board shuffled");
        self.emit(GameEvent::Shuffled {
            seeded: outcome.seeded,
        });
        Some(outcome)
    }

    // The board is match-free here. A near-run keeps it that way; if none
    // fits, planted runs are resolved once more without counting.
    fn plant_last_resort(&mut self) {
        if solver::plant_near_run(&mut self.board, &mut self.rng).is_some() {
            return;
        }
        warn!("no room for a near-run, planting full runs");
        solver::seed_guaranteed_runs(&mut self.board, &mut self.rng, self.config.seeded_runs);
        self.emit_reletters();
        self.resolve_in_place(Scoring::Uncounted);
    }

    fn emit_reletters(&mut self) {
        self.events
            .extend(self.board.tiles().map(GameEvent::TileRelettered));
    }
}
