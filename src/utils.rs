use crate::engine::{Board, Coord};
use crate::error::ComboError;
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies to this crate.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("combo_board={}", default_level)));
    // A second call (tests, repeated setup) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parses an array of string slices into a `Board`.
///
/// Each string slice is one row, starting from row 0. Every row must contain
/// the same number of characters and every character must be an uppercase
/// ASCII letter (`A`–`Z`). Surrounding whitespace is not allowed; trim lines
/// before calling. Tile identities are assigned row-major.
///
/// # Returns
/// * `Ok(Board)` if parsing is successful.
/// * `Err(ComboError::InvalidBoard)` if there are no rows, a row is empty, rows
///   differ in length, or an unrecognized character is encountered.
///
/// # Examples
/// ```
/// use combo_board::utils::board_from_str_array;
/// use combo_board::engine::Coord;
///
/// let board = board_from_str_array(&["AAB", "CDE"]).unwrap();
/// assert_eq!(board.rows(), 2);
/// assert_eq!(board.cols(), 3);
/// assert_eq!(board.letter_at(Coord::new(1, 2)), Some('E'));
///
/// assert!(board_from_str_array(&["AB1"]).is_err());
/// assert!(board_from_str_array(&["AB", "C"]).is_err());
/// ```
pub fn board_from_str_array(s: &[&str]) -> Result<Board, ComboError> {
    let Some(first) = s.first() else {
        return Err(ComboError::InvalidBoard("board has no rows".to_string()));
    };
    let cols = first.chars().count();
    if cols == 0 {
        return Err(ComboError::InvalidBoard("row 0 is empty".to_string()));
    }

    let mut grid: Vec<Vec<char>> = Vec::with_capacity(s.len());
    for (r, row_str) in s.iter().enumerate() {
        let row: Vec<char> = row_str.chars().collect();
        if row.len() != cols {
            return Err(ComboError::InvalidBoard(format!(
                "row {} has {} letters, expected {}",
                r,
                row.len(),
                cols
            )));
        }
        if let Some((c, bad)) = row
            .iter()
            .enumerate()
            .find(|(_, ch)| !ch.is_ascii_uppercase())
        {
            return Err(ComboError::InvalidBoard(format!(
                "unrecognized character '{}' in row {} col {}",
                bad, r, c
            )));
        }
        grid.push(row);
    }

    Ok(Board::from_fn(grid.len(), cols, |Coord { row, col }| {
        grid[row][col]
    }))
}

/// Reads a board from a text file: one row of letters per non-blank line.
pub fn read_board_file(path: &Path) -> Result<Board, ComboError> {
    let content = fs::read_to_string(path)?;
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    board_from_str_array(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_from_str_array_valid() {
        let board = board_from_str_array(&["AAABCD", "EFGHIJ"]).unwrap();
        assert_eq!(board.rows(), 2);
        assert_eq!(board.cols(), 6);
        assert_eq!(board.letter_at(Coord::new(0, 0)), Some('A'));
        assert_eq!(board.letter_at(Coord::new(1, 5)), Some('J'));
    }

    #[test]
    fn test_board_from_str_array_invalid_char() {
        let err = board_from_str_array(&["ABx"]).unwrap_err();
        assert!(err.to_string().contains("unrecognized character 'x'"));
    }

    #[test]
    fn test_board_from_str_array_with_spaces() {
        let err = board_from_str_array(&["A B"]).unwrap_err();
        assert!(err.to_string().contains("unrecognized character ' '"));
    }

    #[test]
    fn test_board_from_str_array_ragged_rows() {
        let err = board_from_str_array(&["ABC", "AB"]).unwrap_err();
        assert!(err.to_string().contains("row 1 has 2 letters, expected 3"));
    }

    #[test]
    fn test_board_from_str_array_empty_input() {
        let board_str: [&str; 0] = [];
        assert!(board_from_str_array(&board_str).is_err());
        assert!(board_from_str_array(&[""]).is_err());
    }

    #[test]
    fn test_identities_assigned_row_major() {
        let board = board_from_str_array(&["AB", "CD"]).unwrap();
        let ids: Vec<u64> = board.tiles().map(|t| t.id().get()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_read_board_file_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.txt");
        fs::write(&path, "ABC\n\n  DEF  \nGHI\n").unwrap();
        let board = read_board_file(&path).unwrap();
        assert_eq!(board.to_rows(), vec!["ABC", "DEF", "GHI"]);
    }

    #[test]
    fn test_read_board_file_missing() {
        let err = read_board_file(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ComboError::Io(_)));
    }
}
