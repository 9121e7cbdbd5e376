//! Core board model for the letter-combo puzzle.
//!
//! This module defines the game's fundamental components:
//! - `TileId`: An opaque identity that survives swaps.
//! - `Tile`: A lettered cell with its identity and current grid coordinate.
//! - `Coord`: A `(row, col)` grid address.
//! - `Board`: The dense, row-major tile grid with lookup, swap, adjacency and
//!   replacement, plus random generation from the letter frequency table.
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Default number of rows on a board.
pub const DEFAULT_ROWS: usize = 6;
/// Default number of columns on a board.
pub const DEFAULT_COLS: usize = 6;

/// Relative frequency of every letter drawn for new tiles.
///
/// Vowels and common consonants dominate (E, T, A, O, I); Q, J, X and Z are the
/// rarest. The total weight is 102.
pub const LETTER_WEIGHTS: [(char, u32); 26] = [
    ('A', 8),
    ('B', 2),
    ('C', 3),
    ('D', 4),
    ('E', 12),
    ('F', 2),
    ('G', 2),
    ('H', 3),
    ('I', 8),
    ('J', 1),
    ('K', 1),
    ('L', 4),
    ('M', 2),
    ('N', 6),
    ('O', 8),
    ('P', 2),
    ('Q', 1),
    ('R', 6),
    ('S', 6),
    ('T', 9),
    ('U', 4),
    ('V', 2),
    ('W', 2),
    ('X', 1),
    ('Y', 2),
    ('Z', 1),
];

fn letter_pool() -> &'static [char] {
    static POOL: OnceLock<Vec<char>> = OnceLock::new();
    POOL.get_or_init(|| {
        LETTER_WEIGHTS
            .iter()
            .flat_map(|&(letter, weight)| std::iter::repeat(letter).take(weight as usize))
            .collect()
    })
}

/// Draws a letter according to [`LETTER_WEIGHTS`].
///
/// History of the board plays no part: every draw is independent.
pub fn generate_random_letter(rng: &mut impl Rng) -> char {
    letter_pool().choose(rng).copied().unwrap_or('A')
}

/// Draws a letter uniformly from `A..=Z`.
pub fn generate_uniform_letter(rng: &mut impl Rng) -> char {
    char::from(b'A' + rng.gen_range(0..26u8))
}

/// Stable identity of a tile.
///
/// Handles are minted by the owning [`Board`] and never reused within it, so a
/// tile keeps its identity while its coordinate changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u64);

impl TileId {
    /// Returns the raw handle value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A grid address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }

    /// Manhattan distance between two coordinates.
    pub fn distance(self, other: Coord) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// True for orthogonal neighbours; diagonals and the coordinate itself are not adjacent.
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.distance(other) == 1
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A single lettered cell on the board.
///
/// Two tiles are equal iff their identities match; letter and position play no
/// part in equality or hashing.
///
/// # Examples
///
/// ```
/// use combo_board::engine::{Board, Coord};
/// let mut board = Board::new_random_with_seed(6, 6, 7);
/// let before = board.get(Coord::new(0, 0)).unwrap();
/// board.swap(Coord::new(0, 0), Coord::new(0, 1));
/// let after = board.get(Coord::new(0, 1)).unwrap();
/// assert_eq!(before, after); // same identity, new position
/// assert_eq!(after.coord(), Coord::new(0, 1));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Tile {
    id: TileId,
    letter: char,
    row: usize,
    col: usize,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

impl PartialEq for Tile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tile {}

impl Hash for Tile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The game board: a `rows × cols` grid holding exactly one tile per slot.
///
/// Storage is a dense row-major vector indexed by `(row, col)`. Every tile's own
/// coordinate always agrees with the slot it sits in; `swap` and `replace`
/// update both sides together.
#[derive(Clone, Debug)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
    next_id: u64,
}

impl Board {
    /// Builds a board whose letters are supplied row-major by `letter_at`.
    ///
    /// Identities are assigned row-major starting at 0.
    pub fn from_fn(rows: usize, cols: usize, mut letter_at: impl FnMut(Coord) -> char) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Tile {
                    id: TileId(cells.len() as u64),
                    letter: letter_at(Coord::new(row, col)),
                    row,
                    col,
                });
            }
        }
        let next_id = cells.len() as u64;
        Board {
            rows,
            cols,
            cells,
            next_id,
        }
    }

    /// Creates a board filled from the letter frequency table using `rng`.
    pub fn new_random(rows: usize, cols: usize, rng: &mut impl Rng) -> Self {
        Board::from_fn(rows, cols, |_| generate_random_letter(rng))
    }

    /// Creates a reproducible random board: the same seed always yields the
    /// same letters and identities.
    pub fn new_random_with_seed(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Board::new_random(rows, cols, &mut rng)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True if `coord` lies on the board.
    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    fn index(&self, coord: Coord) -> usize {
        coord.row * self.cols + coord.col
    }

    /// Returns the tile at `coord`, or `None` outside `[0, rows) × [0, cols)`.
    pub fn get(&self, coord: Coord) -> Option<Tile> {
        if self.contains(coord) {
            Some(self.cells[self.index(coord)])
        } else {
            None
        }
    }

    /// Letter at `coord`, or `None` when out of bounds.
    pub fn letter_at(&self, coord: Coord) -> Option<char> {
        self.get(coord).map(|t| t.letter)
    }

    /// Exchanges the tiles stored at `a` and `b`, updating each tile's own
    /// coordinate to match its new slot. Swapping a coordinate with itself does
    /// nothing. Applying the same swap twice restores the original layout.
    ///
    /// # Panics
    /// Panics if either coordinate is outside the board.
    pub fn swap(&mut self, a: Coord, b: Coord) {
        assert!(
            self.contains(a) && self.contains(b),
            "swap {} <-> {} outside {}x{} board",
            a,
            b,
            self.rows,
            self.cols
        );
        if a == b {
            return;
        }
        let (ia, ib) = (self.index(a), self.index(b));
        self.cells.swap(ia, ib);
        self.cells[ia].row = a.row;
        self.cells[ia].col = a.col;
        self.cells[ib].row = b.row;
        self.cells[ib].col = b.col;
    }

    /// True iff the two tiles' stored coordinates are exactly one step apart
    /// horizontally or vertically.
    pub fn is_adjacent(&self, a: &Tile, b: &Tile) -> bool {
        a.coord().is_adjacent(b.coord())
    }

    /// Iterates over every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.cells.iter().copied()
    }

    /// Mints a tile with a fresh identity. It is not on the board until passed
    /// to [`Board::replace`].
    pub fn new_tile(&mut self, letter: char) -> Tile {
        let id = TileId(self.next_id);
        self.next_id += 1;
        Tile {
            id,
            letter,
            row: 0,
            col: 0,
        }
    }

    /// Puts `tile` into the slot at `coord`, first setting the tile's own
    /// coordinate to `coord`. Returns the evicted tile.
    ///
    /// # Panics
    /// Panics if `coord` is outside the board.
    pub fn replace(&mut self, coord: Coord, mut tile: Tile) -> Tile {
        assert!(self.contains(coord), "replace at {} outside board", coord);
        tile.row = coord.row;
        tile.col = coord.col;
        let idx = self.index(coord);
        std::mem::replace(&mut self.cells[idx], tile)
    }

    /// Rewrites the letter of the tile at `coord` in place; identity is kept.
    ///
    /// # Panics
    /// Panics if `coord` is outside the board.
    pub fn set_letter(&mut self, coord: Coord, letter: char) {
        assert!(self.contains(coord), "set_letter at {} outside board", coord);
        let idx = self.index(coord);
        self.cells[idx].letter = letter;
    }

    /// All letters in row-major order.
    pub fn letters(&self) -> Vec<char> {
        self.cells.iter().map(|t| t.letter).collect()
    }

    /// The board as one string per row, e.g. `["AAB", "CDE"]`.
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|t| t.letter).collect())
            .collect()
    }

    /// Renders the board with row and column numbers. Cells listed in
    /// `highlight` are wrapped in brackets, which is how hints are shown on a
    /// terminal.
    pub fn to_string_with_highlight(&self, highlight: &[Coord]) -> String {
        let mut output = String::from("  ");
        for c in 0..self.cols {
            output.push_str(&format!(" {:<2}", c));
        }
        for r in 0..self.rows {
            output.push('\n');
            output.push_str(&format!("{:<2}", r));
            for c in 0..self.cols {
                let coord = Coord::new(r, c);
                let letter = self.cells[self.index(coord)].letter;
                if highlight.contains(&coord) {
                    output.push_str(&format!("[{}]", letter));
                } else {
                    output.push_str(&format!(" {} ", letter));
                }
            }
        }
        output
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_str_array;
    use std::collections::HashSet;

    fn identity_layout(board: &Board) -> Vec<(TileId, Coord, char)> {
        board.tiles().map(|t| (t.id(), t.coord(), t.letter())).collect()
    }

    #[test]
    fn test_letter_weights_total() {
        let total: u32 = LETTER_WEIGHTS.iter().map(|&(_, w)| w).sum();
        assert_eq!(total, 102);
        assert_eq!(letter_pool().len(), 102);
    }

    #[test]
    fn test_random_letters_are_uppercase() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..500 {
            assert!(generate_random_letter(&mut rng).is_ascii_uppercase());
            assert!(generate_uniform_letter(&mut rng).is_ascii_uppercase());
        }
    }

    #[test]
    fn test_new_random_with_seed_determinism() {
        let board1 = Board::new_random_with_seed(6, 6, 123);
        let board2 = Board::new_random_with_seed(6, 6, 123);
        assert_eq!(identity_layout(&board1), identity_layout(&board2));

        let board3 = Board::new_random_with_seed(6, 6, 124);
        assert_ne!(
            board1.letters(),
            board3.letters(),
            "Boards with different seeds should differ."
        );
    }

    #[test]
    fn test_every_slot_holds_a_tile_at_its_own_coordinate() {
        let board = Board::new_random_with_seed(6, 6, 9);
        assert_eq!(board.tiles().count(), 36);
        for r in 0..6 {
            for c in 0..6 {
                let tile = board.get(Coord::new(r, c)).unwrap();
                assert_eq!(tile.coord(), Coord::new(r, c));
            }
        }
        let ids: HashSet<TileId> = board.tiles().map(|t| t.id()).collect();
        assert_eq!(ids.len(), 36);
    }

    #[test]
    fn test_get_out_of_bounds_is_none() {
        let board = Board::new_random_with_seed(6, 6, 0);
        assert!(board.get(Coord::new(6, 0)).is_none());
        assert!(board.get(Coord::new(0, 6)).is_none());
        assert!(board.get(Coord::new(5, 5)).is_some());
    }

    #[test]
    fn test_swap_moves_identity_and_updates_coordinates() {
        let mut board = board_from_str_array(&["ABC", "DEF", "GHI"]).unwrap();
        let a = board.get(Coord::new(0, 0)).unwrap();
        let b = board.get(Coord::new(0, 1)).unwrap();

        board.swap(a.coord(), b.coord());

        let moved_a = board.get(Coord::new(0, 1)).unwrap();
        let moved_b = board.get(Coord::new(0, 0)).unwrap();
        assert_eq!(moved_a, a);
        assert_eq!(moved_b, b);
        assert_eq!(moved_a.letter(), 'A');
        assert_eq!(moved_a.coord(), Coord::new(0, 1));
        assert_eq!(moved_b.coord(), Coord::new(0, 0));
    }

    #[test]
    fn test_swap_twice_restores_layout() {
        let mut board = Board::new_random_with_seed(6, 6, 42);
        let before = identity_layout(&board);
        board.swap(Coord::new(2, 3), Coord::new(3, 3));
        assert_ne!(identity_layout(&board), before);
        board.swap(Coord::new(2, 3), Coord::new(3, 3));
        assert_eq!(identity_layout(&board), before);
    }

    #[test]
    fn test_swap_with_itself_is_noop() {
        let mut board = Board::new_random_with_seed(6, 6, 5);
        let before = identity_layout(&board);
        board.swap(Coord::new(1, 1), Coord::new(1, 1));
        assert_eq!(identity_layout(&board), before);
    }

    #[test]
    #[should_panic]
    fn test_swap_out_of_bounds_panics() {
        let mut board = Board::new_random_with_seed(6, 6, 5);
        board.swap(Coord::new(0, 5), Coord::new(0, 6));
    }

    #[test]
    fn test_is_adjacent() {
        let board = board_from_str_array(&["ABC", "DEF", "GHI"]).unwrap();
        let t = |r, c| board.get(Coord::new(r, c)).unwrap();
        assert!(board.is_adjacent(&t(1, 1), &t(0, 1)));
        assert!(board.is_adjacent(&t(1, 1), &t(1, 2)));
        assert!(!board.is_adjacent(&t(1, 1), &t(0, 0)), "diagonal");
        assert!(!board.is_adjacent(&t(0, 0), &t(0, 2)), "two apart");
        assert!(!board.is_adjacent(&t(1, 1), &t(1, 1)), "same tile");
    }

    #[test]
    fn test_replace_sets_coordinate_and_fresh_identity() {
        let mut board = Board::new_random_with_seed(6, 6, 3);
        let old = board.get(Coord::new(4, 2)).unwrap();
        let fresh = board.new_tile('Q');
        assert!(board.tiles().all(|t| t.id() != fresh.id()));

        let evicted = board.replace(Coord::new(4, 2), fresh);
        assert_eq!(evicted, old);
        let placed = board.get(Coord::new(4, 2)).unwrap();
        assert_eq!(placed, fresh);
        assert_eq!(placed.coord(), Coord::new(4, 2));
        assert_eq!(placed.letter(), 'Q');
    }

    #[test]
    fn test_set_letter_keeps_identity() {
        let mut board = Board::new_random_with_seed(6, 6, 3);
        let before = board.get(Coord::new(0, 0)).unwrap();
        board.set_letter(Coord::new(0, 0), 'Z');
        let after = board.get(Coord::new(0, 0)).unwrap();
        assert_eq!(before, after);
        assert_eq!(after.letter(), 'Z');
    }

    #[test]
    fn test_tiles_are_row_major_and_restartable() {
        let board = board_from_str_array(&["AB", "CD"]).unwrap();
        let first: String = board.tiles().map(|t| t.letter()).collect();
        let second: String = board.tiles().map(|t| t.letter()).collect();
        assert_eq!(first, "ABCD");
        assert_eq!(first, second);
    }

    #[test]
    fn test_display_board_formatting() {
        let board = board_from_str_array(&["ABC", "DEF"]).unwrap();
        let display_str = format!("{}", board);
        assert_eq!(display_str.lines().count(), 3);
        assert!(display_str.lines().next().unwrap().contains("0  1  2"));
        assert!(display_str.contains(" A  B  C "));

        let highlighted = board.to_string_with_highlight(&[Coord::new(1, 2)]);
        assert!(highlighted.contains("[F]"));
    }

    #[test]
    fn test_to_rows() {
        let board = board_from_str_array(&["ABC", "DEF"]).unwrap();
        assert_eq!(board.to_rows(), vec!["ABC".to_string(), "DEF".to_string()]);
    }
}
