use anyhow::{Context, Result};
use clap::Parser;
use combo_board::config::{DEFAULT_SEEDED_RUNS, DEFAULT_SHUFFLE_ATTEMPTS};
use combo_board::solver::{find_hint, legal_moves, shuffle_board};
use combo_board::utils::{init_tracing, read_board_file};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Find a hint on a board, or reshuffle it when stuck",
    long_about = None
)]
struct Args {
    /// List every legal swap instead of only the first
    #[clap(short, long)]
    all: bool,

    /// Seed for the shuffle used when the board has no legal move
    #[clap(short, long, default_value_t = 0)]
    seed: u64,

    /// Path to the board file (one row of letters per line)
    board_file: PathBuf,
}

fn main() -> Result<()> {
    init_tracing("info");
    let args = Args::parse();

    let mut board = read_board_file(&args.board_file)
        .with_context(|| format!("failed to read board from {}", args.board_file.display()))?;
    println!(
        "Loaded {}x{} board from {}\n",
        board.rows(),
        board.cols(),
        args.board_file.display()
    );

    if args.all {
        let moves = legal_moves(&board);
        println!("Legal swaps ({}):", moves.len());
        for (i, mv) in moves.iter().enumerate() {
            println!("  Swap {}: {} <-> {} clears {}", i + 1, mv.from, mv.to, mv.matched);
        }
        println!();
    }

    if let Some((a, b)) = find_hint(&board) {
        println!(
            "Hint: swap {} '{}' with {} '{}'\n",
            a.coord(),
            a.letter(),
            b.coord(),
            b.letter()
        );
        println!("{}", board.to_string_with_highlight(&[a.coord(), b.coord()]));
        return Ok(());
    }

    println!("No legal move on this board. Shuffling...\n");
    let mut rng = SmallRng::seed_from_u64(args.seed);
    let outcome = shuffle_board(
        &mut board,
        &mut rng,
        DEFAULT_SHUFFLE_ATTEMPTS,
        DEFAULT_SEEDED_RUNS,
    );
    if outcome.seeded {
        println!("Every rearrangement was stuck; planted guaranteed runs.");
    } else {
        println!("Solvable arrangement found after {} attempt(s).", outcome.attempts);
    }

    let highlight: Vec<_> = find_hint(&board)
        .map(|(a, b)| vec![a.coord(), b.coord()])
        .unwrap_or_default();
    println!("{}", board.to_string_with_highlight(&highlight));
    Ok(())
}
