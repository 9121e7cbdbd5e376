use anyhow::{Context, Result};
use clap::Parser;
use combo_board::config::EngineConfig;
use combo_board::engine::Coord;
use combo_board::progress::{JsonFileStore, MemoryStore, ProgressStore};
use combo_board::resolver::{GameEvent, SwapOutcome};
use combo_board::session::Session;
use combo_board::state::GameMode;
use combo_board::utils::init_tracing;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play the letter combo puzzle in the terminal", long_about = None)]
struct Args {
    /// Level to play; omit for endless mode
    #[clap(short, long)]
    level: Option<u32>,

    /// Fixed RNG seed for a reproducible game
    #[clap(short, long)]
    seed: Option<u64>,

    /// Engine config JSON file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Progress file (defaults to the user config directory)
    #[clap(long)]
    progress: Option<PathBuf>,

    /// Keep progress in memory only
    #[clap(long)]
    no_save: bool,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn open_store(args: &Args) -> Result<Box<dyn ProgressStore>> {
    if args.no_save {
        return Ok(Box::new(MemoryStore::default()));
    }
    let path = args
        .progress
        .clone()
        .unwrap_or_else(JsonFileStore::default_path);
    let store = JsonFileStore::open(&path)
        .with_context(|| format!("failed to open progress {}", path.display()))?;
    Ok(Box::new(store))
}

fn parse_swap(input: &str) -> Option<(Coord, Coord)> {
    let nums: Vec<usize> = input
        .split_whitespace()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    match nums[..] {
        [r1, c1, r2, c2] => Some((Coord::new(r1, c1), Coord::new(r2, c2))),
        _ => None,
    }
}

fn report(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Matched {
                tiles,
                points,
                combo,
                silent: false,
            } => {
                let word: String = tiles.iter().map(|t| t.letter()).collect();
                println!("  Matched {} (x{} combo): +{}", word, combo, points);
            }
            GameEvent::Shuffled { seeded: true } => {
                println!("  No moves left: the board was rebuilt.")
            }
            GameEvent::Shuffled { seeded: false } => println!("  Board shuffled."),
            GameEvent::NewHighScore(score) => println!("  New high score: {}!", score),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    init_tracing("warn");
    let args = Args::parse();
    let config = load_config(&args)?;
    let watchdog = config.watchdog();
    let store = open_store(&args)?;

    let mode = match args.level {
        Some(number) => GameMode::Level(store.progress().playable_level(number)?.clone()),
        None => GameMode::Endless,
    };
    let mut session = Session::new(mode, config, store, Instant::now())?;
    let mut highlight: Vec<Coord> = Vec::new();

    println!("Welcome to Combo Board!");
    loop {
        // Nothing animates in a terminal, so every lock can be released at once.
        session.tick(Instant::now() + watchdog);
        report(&session.drain_events());

        let state = session.state();
        let moves = state
            .moves_remaining()
            .map_or("unlimited".to_string(), |m| m.to_string());
        println!("---------------------");
        println!(
            "Score: {} / {}, Moves: {}",
            state.score(),
            state.target_score(),
            moves
        );
        println!("{}", session.board().to_string_with_highlight(&highlight));
        highlight.clear();

        if let Some(over) = session.engine().game_over() {
            println!();
            println!("---------------------");
            println!("{}", if over.won { "LEVEL CLEARED!" } else { "GAME OVER" });
            println!("Final Score: {}", over.score);
            if let GameMode::Level(level) = session.engine().mode() {
                println!("Stars: {}", level.calculate_stars(over.score));
            }
            println!("---------------------");
            break;
        }

        print!(
            "Enter a swap (r1 c1 r2 c2), 'h' for a hint, 's' to shuffle, \
             'q' to save and quit: "
        );
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        let now = Instant::now();

        match input {
            "q" => {
                session.exit();
                report(&session.drain_events());
                println!("Thanks for playing!");
                break;
            }
            "h" => match session.request_hint(now) {
                Some((a, b)) => {
                    println!("Try swapping {} and {}.", a.coord(), b.coord());
                    highlight = vec![a.coord(), b.coord()];
                }
                None => println!("No moves available; shuffling."),
            },
            "s" => {
                session.request_shuffle(now);
            }
            _ => match parse_swap(input) {
                Some((a, b)) => match session.request_swap(a, b, now) {
                    SwapOutcome::Rejected(reason) => println!("Invalid move: {}.", reason),
                    SwapOutcome::Reverted => println!("No match; tiles swapped back."),
                    SwapOutcome::Resolved(resolution) => println!(
                        "Cleared {} tiles in {} round(s) for {} points.",
                        resolution.tiles_cleared, resolution.rounds, resolution.points
                    ),
                },
                None => println!("Invalid input format. Use 'r1 c1 r2 c2', 'h', 's', or 'q'."),
            },
        }
    }
    Ok(())
}
