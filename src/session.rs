//! Session controller between presentation and the resolution engine.
//!
//! The engine resolves a swap in one call, but presentation needs time to
//! animate it. The session bridges the two: it locks input after anything
//! that animates, counts animations in flight, and holds hint and shuffle
//! requests until the board is idle again. A watchdog releases the lock once
//! no animation is running and the configured window has passed, so input can
//! never stay stuck.
//!
//! Time is always passed in, which keeps the lock logic deterministic.

use crate::config::EngineConfig;
use crate::engine::{Board, Coord, Tile};
use crate::error::{ComboError, SwapRejection};
use crate::progress::ProgressStore;
use crate::resolver::{GameEvent, ResolutionEngine, SwapOutcome};
use crate::solver::ShuffleOutcome;
use crate::state::{GameMode, GameOver, GameState};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub struct Session {
    engine: ResolutionEngine,
    store: Box<dyn ProgressStore>,
    events: Vec<GameEvent>,
    input_locked: bool,
    animations_in_flight: u32,
    last_activity: Instant,
    watchdog: Duration,
    queued_hint: bool,
    queued_shuffle: bool,
    exited: bool,
}

impl Session {
    /// Starts a session: generates and auto-resolves a board for `mode`, and
    /// shuffles straight away if it happens to have no legal move.
    pub fn new(
        mode: GameMode,
        config: EngineConfig,
        store: Box<dyn ProgressStore>,
        now: Instant,
    ) -> Result<Self, ComboError> {
        let engine = ResolutionEngine::new(mode, config)?;
        Ok(Session::with_engine(engine, store, now))
    }

    /// Wraps an engine that is already set up, e.g. around a fixed board.
    /// Its queued events carry over, and it is shuffled if it has no legal move.
    pub fn with_engine(
        engine: ResolutionEngine,
        store: Box<dyn ProgressStore>,
        now: Instant,
    ) -> Self {
        let watchdog = engine.config().watchdog();
        let mut session = Session {
            engine,
            store,
            events: Vec::new(),
            input_locked: false,
            animations_in_flight: 0,
            last_activity: now,
            watchdog,
            queued_hint: false,
            queued_shuffle: false,
            exited: false,
        };
        session.collect();
        session.ensure_playable();
        session
    }

    /// Throws the current game away and starts `mode` on a new board.
    #[instrument(level = "debug", skip(self, now))]
    pub fn restart(&mut self, mode: GameMode, now: Instant) {
        self.engine.initialize(mode);
        self.events.clear();
        self.input_locked = false;
        self.animations_in_flight = 0;
        self.last_activity = now;
        self.queued_hint = false;
        self.queued_shuffle = false;
        self.exited = false;
        self.collect();
        self.ensure_playable();
    }

    pub fn engine(&self) -> &ResolutionEngine {
        &self.engine
    }

    pub fn board(&self) -> &Board {
        self.engine.board()
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.engine.is_finished()
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn animations_in_flight(&self) -> u32 {
        self.animations_in_flight
    }

    /// True while input is locked or any animation is still running.
    pub fn is_busy(&self) -> bool {
        self.input_locked || self.animations_in_flight > 0
    }

    pub fn has_queued_hint(&self) -> bool {
        self.queued_hint
    }

    pub fn has_queued_shuffle(&self) -> bool {
        self.queued_shuffle
    }

    /// Takes every queued event, engine and session events interleaved in
    /// the order they happened.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.collect();
        std::mem::take(&mut self.events)
    }

    fn collect(&mut self) {
        self.events.extend(self.engine.drain_events());
    }

    fn lock(&mut self, now: Instant) {
        self.last_activity = now;
        if !self.input_locked {
            self.input_locked = true;
            self.events.push(GameEvent::ControlsEnabled(false));
        }
    }

    fn unlock(&mut self) {
        if self.input_locked {
            self.input_locked = false;
            self.events.push(GameEvent::ControlsEnabled(true));
        }
    }

    /// Presentation started an animation.
    pub fn begin_animation(&mut self, now: Instant) {
        self.animations_in_flight += 1;
        self.last_activity = now;
    }

    /// Presentation finished an animation. Unmatched calls are ignored.
    pub fn end_animation(&mut self, now: Instant) {
        self.animations_in_flight = self.animations_in_flight.saturating_sub(1);
        self.last_activity = now;
    }

    /// Plays a player swap unless the board is busy or the game is over.
    ///
    /// Any accepted swap, reverted or resolved, locks input until the
    /// watchdog releases it. When a resolution leaves no legal move a shuffle
    /// is queued for the next idle tick.
    #[instrument(level = "debug", skip(self, now))]
    pub fn request_swap(&mut self, a: Coord, b: Coord, now: Instant) -> SwapOutcome {
        if self.engine.is_finished() {
            return SwapOutcome::Rejected(SwapRejection::GameOver);
        }
        if self.is_busy() {
            return SwapOutcome::Rejected(SwapRejection::Busy);
        }

        let outcome = self.engine.request_swap(a, b);
        self.collect();
        if outcome.is_accepted() {
            self.lock(now);
        }

        if let SwapOutcome::Resolved(resolution) = &outcome {
            if let Some(over) = &resolution.game_over {
                self.report_game_over(over);
            } else if !self.engine.has_any_legal_move() {
                debug!("no legal move left, queueing shuffle");
                self.queued_shuffle = true;
            }
        }
        outcome
    }

    /// Shows a hint now, or queues it if the board is busy.
    ///
    /// When no legal move exists the board is shuffled instead and `None` is
    /// returned.
    pub fn request_hint(&mut self, now: Instant) -> Option<(Tile, Tile)> {
        if self.engine.is_finished() {
            return None;
        }
        if self.is_busy() {
            debug!("busy, hint queued");
            self.queued_hint = true;
            return None;
        }
        self.run_hint(now)
    }

    /// Shuffles now, or queues it if the board is busy.
    pub fn request_shuffle(&mut self, now: Instant) -> Option<ShuffleOutcome> {
        if self.engine.is_finished() {
            return None;
        }
        if self.is_busy() {
            debug!("busy, shuffle queued");
            self.queued_shuffle = true;
            return None;
        }
        self.run_shuffle(now)
    }

    fn run_hint(&mut self, now: Instant) -> Option<(Tile, Tile)> {
        let hint = self.engine.hint();
        self.collect();
        if hint.is_none() {
            debug!("no hint available, shuffling");
            self.run_shuffle(now);
        }
        hint
    }

    fn run_shuffle(&mut self, now: Instant) -> Option<ShuffleOutcome> {
        let outcome = self.engine.shuffle();
        self.collect();
        if outcome.is_some() {
            self.lock(now);
        }
        outcome
    }

    // A fresh board is shown without animation, so this shuffle does not lock.
    fn ensure_playable(&mut self) {
        if !self.engine.has_any_legal_move() {
            debug!("fresh board has no legal move");
            self.engine.shuffle();
            self.collect();
        }
    }

    /// Advances session time.
    ///
    /// Releases the input lock when no animation is in flight and at least
    /// the watchdog window has passed since the last activity. Once idle, a
    /// queued shuffle runs before a queued hint; each tick runs at most one
    /// of them.
    pub fn tick(&mut self, now: Instant) {
        if self.input_locked
            && self.animations_in_flight == 0
            && now.saturating_duration_since(self.last_activity) >= self.watchdog
        {
            debug!("watchdog released input");
            self.unlock();
        }
        if self.is_busy() || self.engine.is_finished() {
            return;
        }

        if self.queued_shuffle {
            self.queued_shuffle = false;
            self.run_shuffle(now);
        } else if self.queued_hint {
            self.queued_hint = false;
            self.run_hint(now);
        }
    }

    fn report_game_over(&mut self, over: &GameOver) {
        if self.engine.mode().is_endless() {
            return;
        }
        let level = self.engine.state().level_number();
        match self.store.record_level_result(level, over.score) {
            Ok(result) => info!(
                level,
                won = result.won,
                stars = result.stars,
                unlocked = ?result.unlocked,
                "level result recorded"
            ),
            Err(err) => warn!(level, error = %err, "could not record level result"),
        }
    }

    /// Leaves the game ("save and exit").
    ///
    /// A positive score goes on the leaderboard, announced with
    /// [`GameEvent::NewHighScore`] when it beats every stored score. Endless
    /// play then ends as a loss and reports [`GameEvent::GameOver`]; a level
    /// left early is simply abandoned. Only the first call has any effect.
    pub fn exit(&mut self) -> Option<GameOver> {
        if self.exited {
            return None;
        }
        self.exited = true;

        let score = self.engine.state().score();
        if score > 0 {
            if self.store.progress().is_high_score(score) {
                self.events.push(GameEvent::NewHighScore(score));
            }
            if let Err(err) = self.store.record_score(score) {
                warn!(score, error = %err, "could not record score");
            }
        }

        let over = self.engine.end();
        self.collect();
        self.queued_hint = false;
        self.queued_shuffle = false;
        over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStore;
    use crate::state::Level;

    fn config() -> EngineConfig {
        EngineConfig::default().with_seed(21)
    }

    fn level_mode(moves_limit: u32) -> GameMode {
        let mut level = Level::catalog().remove(0);
        level.moves_limit = moves_limit;
        GameMode::Level(level)
    }

    fn session(mode: GameMode, now: Instant) -> Session {
        Session::new(mode, config(), Box::new(MemoryStore::default()), now).unwrap()
    }

    fn hint_coords(session: &Session) -> (Coord, Coord) {
        let (a, b) = crate::solver::find_hint(session.board()).unwrap();
        (a.coord(), b.coord())
    }

    #[test]
    fn test_new_session_is_idle_and_playable() {
        let now = Instant::now();
        let session = session(GameMode::Endless, now);
        assert!(!session.is_busy());
        assert!(session.engine().has_any_legal_move());
    }

    #[test]
    fn test_accepted_swap_locks_until_watchdog() {
        let start = Instant::now();
        let mut session = session(GameMode::Endless, start);
        let (a, b) = hint_coords(&session);

        assert!(session.request_swap(a, b, start).is_accepted());
        assert!(session.is_input_locked());
        assert_eq!(
            session.request_swap(a, b, start),
            SwapOutcome::Rejected(SwapRejection::Busy)
        );

        session.tick(start + Duration::from_millis(249));
        assert!(session.is_input_locked());
        // A board left without moves reshuffles on release, which locks again.
        let reshuffle = session.has_queued_shuffle();
        session.tick(start + Duration::from_millis(250));
        assert_eq!(session.is_input_locked(), reshuffle);

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::ControlsEnabled(false)));
        assert!(events.contains(&GameEvent::ControlsEnabled(true)));
    }

    #[test]
    fn test_watchdog_waits_for_animations() {
        let start = Instant::now();
        let mut session = session(GameMode::Endless, start);
        let (a, b) = hint_coords(&session);
        session.request_swap(a, b, start);

        session.begin_animation(start);
        session.tick(start + Duration::from_secs(5));
        assert!(session.is_busy());

        let done = start + Duration::from_secs(5);
        session.end_animation(done);
        session.tick(done + Duration::from_millis(100));
        assert!(session.is_busy());
        let reshuffle = session.has_queued_shuffle();
        session.tick(done + Duration::from_millis(250));
        assert_eq!(session.is_busy(), reshuffle);
    }

    #[test]
    fn test_rejected_swap_does_not_lock() {
        let now = Instant::now();
        let mut session = session(GameMode::Endless, now);
        let outcome = session.request_swap(Coord::new(0, 0), Coord::new(2, 2), now);
        assert_eq!(outcome, SwapOutcome::Rejected(SwapRejection::NotAdjacent));
        assert!(!session.is_input_locked());
    }

    #[test]
    fn test_requests_queue_while_busy_shuffle_first() {
        let start = Instant::now();
        let mut session = session(GameMode::Endless, start);
        let (a, b) = hint_coords(&session);
        session.request_swap(a, b, start);
        session.drain_events();

        assert!(session.request_hint(start).is_none());
        assert!(session.request_shuffle(start).is_none());
        assert!(session.request_hint(start).is_none());
        assert!(session.has_queued_hint());
        assert!(session.has_queued_shuffle());

        let idle = start + Duration::from_millis(300);
        session.tick(idle);
        assert!(!session.has_queued_shuffle());
        assert!(session.has_queued_hint());
        assert!(session
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::Shuffled { .. })));

        // The shuffle locked input again; the hint waits for the next window.
        session.tick(idle);
        assert!(session.has_queued_hint());
        session.tick(idle + Duration::from_millis(250));
        assert!(!session.has_queued_hint());
        let hints = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::HintFound(..)))
            .count();
        assert_eq!(hints, 1);
    }

    #[test]
    fn test_idle_hint_runs_immediately() {
        let now = Instant::now();
        let mut session = session(GameMode::Endless, now);
        let expected = hint_coords(&session);
        let (a, b) = session.request_hint(now).unwrap();
        assert_eq!((a.coord(), b.coord()), expected);
        assert!(!session.is_input_locked());
    }

    #[test]
    fn test_level_game_over_recorded_once() {
        let mut now = Instant::now();
        let mut session = session(level_mode(3), now);
        let mut overs = 0;
        while !session.is_finished() {
            now += Duration::from_millis(300);
            session.tick(now);
            if session.is_busy() {
                continue;
            }
            let (a, b) = hint_coords(&session);
            session.request_swap(a, b, now);
            overs += session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver(_)))
                .count();
        }
        assert_eq!(overs, 1);
        assert_eq!(session.state().moves_remaining(), Some(0));
        assert_eq!(
            session.request_swap(Coord::new(0, 0), Coord::new(0, 1), now),
            SwapOutcome::Rejected(SwapRejection::GameOver)
        );
        let won = session.state().score() >= 1000;
        assert_eq!(session.store().progress().level(2).unwrap().is_unlocked, won);
        assert!(session.exit().is_none());
    }

    #[test]
    fn test_endless_exit_records_score() {
        let mut now = Instant::now();
        let mut session = session(GameMode::Endless, now);
        let (a, b) = hint_coords(&session);
        session.request_swap(a, b, now);
        let score = session.state().score();
        assert!(score > 0);
        now += Duration::from_secs(1);
        session.tick(now);

        let over = session.exit().unwrap();
        assert!(!over.won);
        assert_eq!(over.score, score);
        assert!(session.is_finished());
        assert_eq!(session.store().progress().scores, vec![score]);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::NewHighScore(score)));
        assert!(events.contains(&GameEvent::GameOver(over)));

        assert!(session.exit().is_none());
        assert_eq!(session.store().progress().scores.len(), 1);
    }

    #[test]
    fn test_exit_with_zero_score_records_nothing() {
        let now = Instant::now();
        let board = crate::utils::board_from_str_array(&[
            "AABCDE", "FGAHIJ", "KLMNOP", "QRSTUV", "WXYZBC", "DEFGHI",
        ])
        .unwrap();
        let engine = ResolutionEngine::with_board(board, level_mode(20), config());
        let mut session = Session::with_engine(engine, Box::new(MemoryStore::default()), now);
        assert_eq!(session.state().score(), 0);
        assert!(session.exit().is_none());
        assert!(session.store().progress().scores.is_empty());
        assert!(session.is_finished());
    }

    #[test]
    fn test_restart_clears_everything() {
        let now = Instant::now();
        let mut session = session(GameMode::Endless, now);
        let (a, b) = hint_coords(&session);
        session.request_swap(a, b, now);
        session.request_hint(now);
        session.exit();

        session.restart(level_mode(20), now);

        assert!(!session.is_finished());
        assert!(!session.is_busy());
        assert!(!session.has_queued_hint());
        assert_eq!(session.state().moves_remaining(), Some(20));
        let events = session.drain_events();
        assert!(events.iter().all(|e| !matches!(e, GameEvent::GameOver(_))));
        let auto_points: u32 = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::Matched { points, silent: true, .. } => Some(*points),
                _ => None,
            })
            .sum();
        assert_eq!(session.state().score(), auto_points);
    }
}
