//! Move-selection strategies for automated play.
//!
//! Each strategy looks at the board and picks one of the legal swaps, or
//! returns `None` when there is none (the caller should shuffle).
use crate::engine::Board;
use crate::matcher::find_matches;
use crate::solver::{find_hint, legal_moves, CandidateMove};
use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::Rng;

/// Takes the same swap a hint would show: the first legal one in row-major
/// scan order.
pub fn choose_move_first_hint(board: &Board) -> Option<CandidateMove> {
    let (a, b) = find_hint(board)?;
    let mut probe = board.clone();
    probe.swap(a.coord(), b.coord());
    Some(CandidateMove {
        from: a.coord(),
        to: b.coord(),
        matched: find_matches(&probe).len(),
    })
}

/// Chooses the swap that clears the most tiles on the first round.
///
/// Ties go to the earliest move in scan order, so the choice is deterministic.
pub fn choose_move_largest_match(board: &Board) -> Option<CandidateMove> {
    legal_moves(board)
        .into_iter()
        .fold(None, |best: Option<CandidateMove>, mv| match best {
            Some(b) if b.matched >= mv.matched => Some(b),
            _ => Some(mv),
        })
}

/// Chooses the swap nearest the bottom of the board, largest match first
/// among equals. Matches low on the board leave the rows above untouched,
/// which keeps existing near-runs intact for later moves.
pub fn choose_move_bottom_first(board: &Board) -> Option<CandidateMove> {
    legal_moves(board)
        .into_iter()
        .max_by_key(|mv| (mv.from.row.max(mv.to.row), mv.matched))
}

/// Picks any legal swap uniformly at random. Serves as the baseline.
pub fn choose_move_random(board: &Board, rng: &mut impl Rng) -> Option<CandidateMove> {
    legal_moves(board).choose(rng).copied()
}

/// The strategies available to the simulator, selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    FirstHint,
    LargestMatch,
    BottomFirst,
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::FirstHint,
        Strategy::LargestMatch,
        Strategy::BottomFirst,
        Strategy::Random,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::FirstHint => "first-hint",
            Strategy::LargestMatch => "largest-match",
            Strategy::BottomFirst => "bottom-first",
            Strategy::Random => "random",
        }
    }

    pub fn choose(self, board: &Board, rng: &mut impl Rng) -> Option<CandidateMove> {
        match self {
            Strategy::FirstHint => choose_move_first_hint(board),
            Strategy::LargestMatch => choose_move_largest_match(board),
            Strategy::BottomFirst => choose_move_bottom_first(board),
            Strategy::Random => choose_move_random(board, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Coord;
    use crate::utils::board_from_str_array;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    // (0,2)<->(1,2) makes AAA in row 0. (3,2)<->(4,2) makes BBBBB in row 3,
    // further down and larger; two more swaps in row 3 make three B's.
    fn board() -> Board {
        board_from_str_array(&["AABCDE", "FGAHIJ", "KLMNOP", "BBQBBR", "STBVWX"]).unwrap()
    }

    #[test]
    fn test_first_hint_matches_solver_hint() {
        let mv = choose_move_first_hint(&board()).unwrap();
        assert_eq!(mv.from, Coord::new(0, 2));
        assert_eq!(mv.to, Coord::new(1, 2));
        assert_eq!(mv.matched, 3);
    }

    #[test]
    fn test_largest_match_prefers_longer_run() {
        let mv = choose_move_largest_match(&board()).unwrap();
        assert_eq!(mv.matched, 5);
        assert_eq!((mv.from, mv.to), (Coord::new(3, 2), Coord::new(4, 2)));
        assert_eq!(legal_moves(&board()).len(), 4);
    }

    #[test]
    fn test_bottom_first_prefers_lower_rows() {
        let mv = choose_move_bottom_first(&board()).unwrap();
        assert_eq!(mv.to, Coord::new(4, 2));
    }

    #[test]
    fn test_random_picks_a_legal_move() {
        let board = board();
        let legal = legal_moves(&board);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let mv = choose_move_random(&board, &mut rng).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn test_no_moves_means_none() {
        let board = board_from_str_array(&["ABC", "DEF", "GHI"]).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        for strategy in Strategy::ALL {
            assert!(strategy.choose(&board, &mut rng).is_none(), "{}", strategy.name());
        }
    }
}
