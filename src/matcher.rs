//! Run detection.
//!
//! A run is a maximal stretch of equal letters along one row or one column.
//! Runs of three or more are matches; every tile of such a run is matched, not
//! just the first three. Diagonals never count.

use crate::engine::{Board, Coord, Tile, TileId};
use std::collections::HashSet;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A maximal same-letter run of at least [`MIN_RUN`] tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Run {
    pub letter: char,
    pub start: Coord,
    pub len: usize,
    pub orientation: Orientation,
}

impl Run {
    /// Coordinates covered by the run, from `start` outwards.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.len).map(move |i| match self.orientation {
            Orientation::Horizontal => Coord::new(self.start.row, self.start.col + i),
            Orientation::Vertical => Coord::new(self.start.row + i, self.start.col),
        })
    }
}

/// The set of matched tiles, deduplicated by identity and kept in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSet {
    tiles: Vec<Tile>,
}

impl MatchSet {
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.iter().any(|t| t.id() == id)
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.tiles.iter().map(Tile::coord)
    }

    pub fn ids(&self) -> HashSet<TileId> {
        self.tiles.iter().map(Tile::id).collect()
    }
}

// Scans one line (a row or a column) given as a sequence of coordinates and
// pushes every run of MIN_RUN or more.
fn scan_line(
    board: &Board,
    line: impl Iterator<Item = Coord>,
    orientation: Orientation,
    runs: &mut Vec<Run>,
) {
    let mut streak: Option<(char, Coord, usize)> = None;
    for coord in line {
        let Some(letter) = board.letter_at(coord) else {
            continue;
        };
        streak = match streak {
            Some((last, start, len)) if last == letter => Some((last, start, len + 1)),
            previous => {
                if let Some((last, start, len)) = previous {
                    if len >= MIN_RUN {
                        runs.push(Run {
                            letter: last,
                            start,
                            len,
                            orientation,
                        });
                    }
                }
                Some((letter, coord, 1))
            }
        };
    }
    if let Some((letter, start, len)) = streak {
        if len >= MIN_RUN {
            runs.push(Run {
                letter,
                start,
                len,
                orientation,
            });
        }
    }
}

/// Finds every horizontal run (rows top to bottom) followed by every vertical
/// run (columns left to right).
pub fn find_runs(board: &Board) -> Vec<Run> {
    let mut runs = Vec::new();
    for r in 0..board.rows() {
        scan_line(
            board,
            (0..board.cols()).map(|c| Coord::new(r, c)),
            Orientation::Horizontal,
            &mut runs,
        );
    }
    for c in 0..board.cols() {
        scan_line(
            board,
            (0..board.rows()).map(|r| Coord::new(r, c)),
            Orientation::Vertical,
            &mut runs,
        );
    }
    runs
}

/// Returns every tile that belongs to a horizontal or vertical run of three or
/// more equal letters.
///
/// A tile on both a horizontal and a vertical run appears once. The result is
/// a pure function of the board: calling it twice on an unchanged board gives
/// identical sets.
///
/// # Examples
/// ```
/// use combo_board::matcher::find_matches;
/// use combo_board::utils::board_from_str_array;
///
/// let board = board_from_str_array(&["AAAB", "CDEF", "GHIJ"]).unwrap();
/// let matches = find_matches(&board);
/// assert_eq!(matches.len(), 3);
/// ```
pub fn find_matches(board: &Board) -> MatchSet {
    let mut matched = vec![false; board.rows() * board.cols()];
    for run in find_runs(board) {
        for coord in run.coords() {
            matched[coord.row * board.cols() + coord.col] = true;
        }
    }
    let tiles = board
        .tiles()
        .zip(matched)
        .filter_map(|(tile, hit)| hit.then_some(tile))
        .collect();
    MatchSet { tiles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_str_array;

    fn matched_coords(board: &Board) -> Vec<(usize, usize)> {
        find_matches(board)
            .coords()
            .map(|c| (c.row, c.col))
            .collect()
    }

    #[test]
    fn test_row_of_three_at_start() {
        let board = board_from_str_array(&[
            "AAABCD",
            "EFGHIJ",
            "KLMNOP",
            "QRSTUV",
            "WXYZAB",
            "CDEFGH",
        ])
        .unwrap();
        assert_eq!(matched_coords(&board), vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn test_run_of_two_is_not_a_match() {
        let board = board_from_str_array(&["AABCDE", "FGHIJK", "LMNOPQ"]).unwrap();
        assert!(find_matches(&board).is_empty());
        assert!(find_runs(&board).is_empty());
    }

    #[test]
    fn test_long_run_awards_every_tile() {
        let board = board_from_str_array(&["BEEEEE", "FGHIJK", "LMNOPQ"]).unwrap();
        assert_eq!(
            matched_coords(&board),
            vec![(0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]
        );
        let runs = find_runs(&board);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len, 5);
        assert_eq!(runs[0].letter, 'E');
        assert_eq!(runs[0].start, Coord::new(0, 1));
    }

    #[test]
    fn test_vertical_run_at_bottom_edge() {
        let board = board_from_str_array(&["ABC", "DBF", "GBI", "JBL"]).unwrap();
        assert_eq!(
            matched_coords(&board),
            vec![(0, 1), (1, 1), (2, 1), (3, 1)]
        );
        assert_eq!(find_runs(&board)[0].orientation, Orientation::Vertical);
    }

    #[test]
    fn test_cross_shape_is_deduplicated() {
        // Row 1 and column 1 share (1, 1).
        let board = board_from_str_array(&["BAC", "AAA", "DAE"]).unwrap();
        let matches = find_matches(&board);
        assert_eq!(matches.len(), 5);
        assert_eq!(
            matched_coords(&board),
            vec![(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)]
        );
        assert_eq!(find_runs(&board).len(), 2);
    }

    #[test]
    fn test_diagonal_is_ignored() {
        let board = board_from_str_array(&["ABC", "DAF", "GHA"]).unwrap();
        assert!(find_matches(&board).is_empty());
    }

    #[test]
    fn test_two_runs_in_one_row() {
        let board = board_from_str_array(&["AAABBB", "CDEFGH"]).unwrap();
        assert_eq!(matched_coords(&board).len(), 6);
        assert_eq!(find_runs(&board).len(), 2);
    }

    #[test]
    fn test_find_matches_is_idempotent() {
        let board = Board::new_random_with_seed(6, 6, 77);
        let first = find_matches(&board);
        let second = find_matches(&board);
        assert_eq!(first, second);
    }

    #[test]
    fn test_contains_and_ids() {
        let board = board_from_str_array(&["ZZZ", "ABC"]).unwrap();
        let matches = find_matches(&board);
        let z = board.get(Coord::new(0, 0)).unwrap();
        let a = board.get(Coord::new(1, 0)).unwrap();
        assert!(matches.contains(z.id()));
        assert!(!matches.contains(a.id()));
        assert_eq!(matches.ids().len(), 3);
    }
}
