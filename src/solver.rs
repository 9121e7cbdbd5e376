//! Move search: hints, the solvability probe, and the shuffle that always
//! leaves at least one legal move on the board.
use crate::engine::{generate_uniform_letter, Board, Coord, Tile};
use crate::matcher::{find_matches, Orientation, Run, MIN_RUN};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Random placements tried per orientation when planting a run.
const PLACEMENT_TRIES: u32 = 20;

/// A swap that would produce a match, with the number of tiles it would clear
/// on the first round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateMove {
    pub from: Coord,
    pub to: Coord,
    pub matched: usize,
}

/// Result of [`shuffle_board`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShuffleOutcome {
    /// Permutations tried.
    pub attempts: u32,
    /// True when every permutation failed and runs had to be planted.
    pub seeded: bool,
}

// Every (tile, right neighbour) and (tile, bottom neighbour) pair, row-major,
// right before bottom.
fn neighbour_pairs(rows: usize, cols: usize) -> impl Iterator<Item = (Coord, Coord)> {
    (0..rows).flat_map(move |r| {
        (0..cols).flat_map(move |c| {
            let here = Coord::new(r, c);
            let right = (c + 1 < cols).then(|| (here, Coord::new(r, c + 1)));
            let below = (r + 1 < rows).then(|| (here, Coord::new(r + 1, c)));
            right.into_iter().chain(below)
        })
    })
}

// Tentatively swaps, counts matched tiles, swaps back.
fn probe(board: &mut Board, a: Coord, b: Coord) -> usize {
    board.swap(a, b);
    let matched = find_matches(board).len();
    board.swap(a, b);
    matched
}

/// Finds the first pair of neighbours, in row-major scan order, whose swap
/// would produce a match. For each tile the right neighbour is tried before
/// the bottom one.
///
/// Returns `None` when no legal move exists; the caller is expected to
/// shuffle in that case.
///
/// # Examples
/// ```
/// use combo_board::solver::find_hint;
/// use combo_board::engine::Coord;
/// use combo_board::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["AABCDE", "FGAHIJ", "KLMNOP"]).unwrap();
/// let (a, b) = find_hint(&board).unwrap();
/// assert_eq!((a.coord(), b.coord()), (Coord::new(0, 2), Coord::new(1, 2)));
/// ```
pub fn find_hint(board: &Board) -> Option<(Tile, Tile)> {
    let mut scratch = board.clone();
    let (a, b) = neighbour_pairs(board.rows(), board.cols())
        .find(|&(a, b)| probe(&mut scratch, a, b) > 0)?;
    Some((board.get(a)?, board.get(b)?))
}

/// Solvability probe: true if at least one adjacent swap yields a match.
pub fn has_any_legal_move(board: &Board) -> bool {
    find_hint(board).is_some()
}

/// Every swap that would produce a match, in hint scan order.
pub fn legal_moves(board: &Board) -> Vec<CandidateMove> {
    let mut scratch = board.clone();
    neighbour_pairs(board.rows(), board.cols())
        .filter_map(|(from, to)| {
            let matched = probe(&mut scratch, from, to);
            (matched > 0).then_some(CandidateMove { from, to, matched })
        })
        .collect()
}

/// Rearranges the board's letters until a legal move exists.
///
/// Letters are permuted among the fixed tiles (identities stay where they
/// are) up to `max_attempts` times. A permutation is accepted only if it
/// differs from the starting arrangement and passes the solvability probe.
/// If every attempt fails, [`seed_guaranteed_runs`] plants runs so a legal
/// move is certain. Score, combo and moves are not touched here.
pub fn shuffle_board(
    board: &mut Board,
    rng: &mut impl Rng,
    max_attempts: u32,
    seeded_runs: u32,
) -> ShuffleOutcome {
    let coords: Vec<Coord> = board.tiles().map(|t| t.coord()).collect();
    let original = board.letters();
    let mut letters = original.clone();

    for attempt in 1..=max_attempts {
        letters.shuffle(rng);
        if letters == original {
            continue;
        }
        for (&coord, &letter) in coords.iter().zip(&letters) {
            board.set_letter(coord, letter);
        }
        if has_any_legal_move(board) {
            debug!(attempt, "shuffle found a solvable arrangement");
            return ShuffleOutcome {
                attempts: attempt,
                seeded: false,
            };
        }
    }

    warn!(
        attempts = max_attempts,
        "no solvable shuffle found, planting runs"
    );
    seed_guaranteed_runs(board, rng, seeded_runs);
    ShuffleOutcome {
        attempts: max_attempts,
        seeded: true,
    }
}

// Tries up to PLACEMENT_TRIES random spots for a three-long run that avoids
// `used`; on success writes the letter and marks the cells.
fn plant_run(
    board: &mut Board,
    rng: &mut impl Rng,
    letter: char,
    orientation: Orientation,
    used: &mut HashSet<Coord>,
) -> bool {
    let (row_span, col_span) = match orientation {
        Orientation::Horizontal => (board.rows(), board.cols().checked_sub(MIN_RUN - 1)),
        Orientation::Vertical => (board.cols(), board.rows().checked_sub(MIN_RUN - 1)),
    };
    let Some(start_range) = col_span.filter(|&n| n > 0) else {
        return false;
    };
    if row_span == 0 {
        return false;
    }

    for _ in 0..PLACEMENT_TRIES {
        let fixed = rng.gen_range(0..row_span);
        let offset = rng.gen_range(0..start_range);
        let start = match orientation {
            Orientation::Horizontal => Coord::new(fixed, offset),
            Orientation::Vertical => Coord::new(offset, fixed),
        };
        let run = Run {
            letter,
            start,
            len: MIN_RUN,
            orientation,
        };
        if run.coords().any(|c| used.contains(&c)) {
            continue;
        }
        for coord in run.coords() {
            board.set_letter(coord, letter);
            used.insert(coord);
        }
        return true;
    }
    false
}

/// Constructive fallback: picks `runs` uniformly random letters and plants
/// each as a horizontal run, or a vertical one if no horizontal spot is free,
/// on cells not used by an earlier run. Every other cell gets an independent
/// uniform letter. Returns how many runs were planted.
///
/// On a board at least three wide or tall, the first run always fits, and a
/// swap inside a planted run keeps the match, so a legal move is guaranteed
/// whenever `runs > 0`.
pub fn seed_guaranteed_runs(board: &mut Board, rng: &mut impl Rng, runs: u32) -> u32 {
    let mut used = HashSet::new();
    let mut planted = 0;
    for _ in 0..runs {
        let letter = generate_uniform_letter(rng);
        if plant_run(board, rng, letter, Orientation::Horizontal, &mut used)
            || plant_run(board, rng, letter, Orientation::Vertical, &mut used)
        {
            planted += 1;
        }
    }

    let free: Vec<Coord> = board
        .tiles()
        .map(|t| t.coord())
        .filter(|c| !used.contains(c))
        .collect();
    for coord in free {
        board.set_letter(coord, generate_uniform_letter(rng));
    }
    debug!(planted, "seeded guaranteed runs");
    planted
}

// The three cells of a near-run anchored at `at`: two in line and the third
// one step off the line past them, so swapping it in completes a run.
fn near_run_cells(at: Coord, orientation: Orientation) -> [Coord; 3] {
    let Coord { row: r, col: c } = at;
    match orientation {
        Orientation::Horizontal => [at, Coord::new(r, c + 1), Coord::new(r + 1, c + 2)],
        Orientation::Vertical => [at, Coord::new(r + 1, c), Coord::new(r + 2, c + 1)],
    }
}

/// Writes one near-run onto a board: one letter on two neighbouring cells
/// and on a third cell diagonal to the end of that pair. The swap that slides
/// the third letter into line becomes a legal move.
///
/// Placements and letters are tried in random order and a placement is kept
/// only if it leaves the board free of matches, so nothing needs resolving
/// afterwards. Returns the swap it set up, or `None` (board unchanged) when
/// the board is too small or every placement would create a match.
pub fn plant_near_run(board: &mut Board, rng: &mut impl Rng) -> Option<(Coord, Coord)> {
    let (rows, cols) = (board.rows(), board.cols());
    let mut anchors: Vec<(Coord, Orientation)> = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            if r + 1 < rows && c + 2 < cols {
                anchors.push((Coord::new(r, c), Orientation::Horizontal));
            }
            if r + 2 < rows && c + 1 < cols {
                anchors.push((Coord::new(r, c), Orientation::Vertical));
            }
        }
    }
    anchors.shuffle(rng);
    let mut alphabet: Vec<char> = ('A'..='Z').collect();

    for (at, orientation) in anchors {
        let cells = near_run_cells(at, orientation);
        let saved: Vec<Option<char>> = cells.iter().map(|&c| board.letter_at(c)).collect();
        alphabet.shuffle(rng);
        for &letter in &alphabet {
            for &cell in &cells {
                board.set_letter(cell, letter);
            }
            if find_matches(board).is_empty() {
                let odd = cells[2];
                let swap = match orientation {
                    Orientation::Horizontal => (odd, Coord::new(odd.row - 1, odd.col)),
                    Orientation::Vertical => (odd, Coord::new(odd.row, odd.col - 1)),
                };
                debug!(%at, ?orientation, %letter, "planted near-run");
                return Some(swap);
            }
        }
        for (&cell, letter) in cells.iter().zip(saved) {
            if let Some(letter) = letter {
                board.set_letter(cell, letter);
            }
        }
    }
    None
}
