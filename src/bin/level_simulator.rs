use anyhow::{bail, Result};
use clap::Parser;
use combo_board::config::EngineConfig;
use combo_board::heuristics::Strategy;
use combo_board::resolver::{ResolutionEngine, SwapOutcome};
use combo_board::state::{GameMode, Level};
use combo_board::utils::init_tracing;
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Autoplay the built-in levels and compare strategies",
    long_about = None
)]
struct Args {
    /// Number of seeded games per level and strategy
    #[clap(short = 'n', long, default_value_t = 20)]
    games: u64,

    /// First seed; games use consecutive seeds from here
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Only simulate this level
    #[clap(short, long)]
    level: Option<u32>,

    /// Only evaluate this strategy
    #[clap(short, long, value_enum)]
    strategy: Option<Strategy>,
}

struct GameResult {
    won: bool,
    score: u32,
    shuffles: u32,
}

fn play(level: &Level, strategy: Strategy, seed: u64) -> Result<GameResult> {
    let config = EngineConfig::default().with_seed(seed);
    let mut engine = ResolutionEngine::new(GameMode::Level(level.clone()), config)?;
    let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(1));
    let mut shuffles = 0;

    while !engine.is_finished() {
        let Some(mv) = strategy.choose(engine.board(), &mut rng) else {
            engine.shuffle();
            shuffles += 1;
            continue;
        };
        match engine.request_swap(mv.from, mv.to) {
            SwapOutcome::Resolved(_) => {}
            other => bail!(
                "strategy {} picked {} <-> {} on level {} seed {}, got {:?}\n{}",
                strategy.name(),
                mv.from,
                mv.to,
                level.number,
                seed,
                other,
                engine.board()
            ),
        }
    }

    let over = engine.game_over().cloned().unwrap_or_else(|| engine.state().game_over(false));
    Ok(GameResult {
        won: over.won,
        score: over.score,
        shuffles,
    })
}

fn main() -> Result<()> {
    init_tracing("warn");
    let args = Args::parse();

    let levels: Vec<Level> = Level::catalog()
        .into_iter()
        .filter(|l| args.level.map_or(true, |n| l.number == n))
        .collect();
    if levels.is_empty() {
        bail!("no such level: {:?}", args.level);
    }
    let strategies: Vec<Strategy> = match args.strategy {
        Some(s) => vec![s],
        None => Strategy::ALL.to_vec(),
    };

    println!(
        "Simulating {} level(s) x {} strategies x {} games...",
        levels.len(),
        strategies.len(),
        args.games
    );

    for level in &levels {
        println!(
            "\nLevel {} (target {}, {} moves)",
            level.number, level.target_score, level.moves_limit
        );
        for &strategy in &strategies {
            let mut wins = 0;
            let mut total_score: u64 = 0;
            let mut total_stars: u64 = 0;
            let mut total_shuffles: u64 = 0;
            for i in 0..args.games {
                let result = play(level, strategy, args.start_seed + i)?;
                if result.won {
                    wins += 1;
                }
                total_score += u64::from(result.score);
                total_stars += u64::from(level.calculate_stars(result.score));
                total_shuffles += u64::from(result.shuffles);
            }
            let games = args.games.max(1) as f64;
            println!(
                "  Strategy: {:<14} Win rate: {:>5.1}%  Avg score: {:>8.1}  \
                 Avg stars: {:.2}  Avg shuffles: {:.2}",
                strategy.name(),
                100.0 * wins as f64 / games,
                total_score as f64 / games,
                total_stars as f64 / games,
                total_shuffles as f64 / games
            );
        }
    }
    Ok(())
}
