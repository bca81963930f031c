//! Defines `SquareLocation` and the algebraic square notation.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::NotationError;


/// A file (vertical line) on the chessboard. From 0 to 7 (0 is the
/// a-file, 7 is the h-file).
pub type File = u8;

/// A rank (horizontal line) on the chessboard. From 0 to 7 (0 is the
/// first rank, 7 is the eighth rank).
pub type Rank = u8;


/// An immutable (file, rank) coordinate pair.
///
/// Instances are always in range: both coordinates are between 0
/// and 7. Equality is by value. Locations can be parsed from and
/// displayed in algebraic notation (`"e4"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SquareLocation {
    file: File,
    rank: Rank,
}

impl SquareLocation {
    /// Creates a new instance, returning `None` if either coordinate
    /// is out of range.
    #[inline]
    pub fn new(file: File, rank: Rank) -> Option<SquareLocation> {
        if file <= 7 && rank <= 7 {
            Some(SquareLocation { file, rank })
        } else {
            None
        }
    }

    /// Creates a new instance from a board index (0 is a1, 1 is b1,
    /// .. , 63 is h8).
    #[inline]
    pub fn from_index(index: usize) -> SquareLocation {
        debug_assert!(index <= 63);
        SquareLocation {
            file: (index % 8) as File,
            rank: (index / 8) as Rank,
        }
    }

    #[inline]
    pub fn file(&self) -> File {
        self.file
    }

    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the board index of the location (0 is a1, 63 is h8).
    #[inline]
    pub fn index(&self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// Returns the location displaced by the given file and rank
    /// deltas, or `None` if it falls off the board.
    #[inline]
    pub fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<SquareLocation> {
        let file = self.file as i8 + file_delta;
        let rank = self.rank as i8 + rank_delta;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(SquareLocation {
                file: file as File,
                rank: rank as Rank,
            })
        } else {
            None
        }
    }

    /// Returns whether the square is dark-colored.
    ///
    /// a1 is dark. This matters only for the insufficient-material
    /// rule, which distinguishes bishops by the color of the squares
    /// they travel on.
    #[inline]
    pub fn is_dark(&self) -> bool {
        (self.file + self.rank) % 2 == 0
    }

    /// Iterates over all 64 locations in board-index order.
    pub fn all() -> impl Iterator<Item = SquareLocation> {
        (0..64).map(SquareLocation::from_index)
    }
}

impl FromStr for SquareLocation {
    type Err = NotationError;

    /// Parses a square given in algebraic notation (`"e4"`).
    fn from_str(s: &str) -> Result<SquareLocation, NotationError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^[a-h][1-8]$").unwrap();
        }

        if RE.is_match(s) {
            let mut chars = s.chars();
            let file = (chars.next().unwrap() as u8 - b'a') as File;
            let rank = (chars.next().unwrap() as u8 - b'1') as Rank;
            Ok(SquareLocation { file, rank })
        } else {
            Err(NotationError)
        }
    }
}

impl fmt::Display for SquareLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "{}{}",
               (b'a' + self.file) as char,
               (b'1' + self.rank) as char)
    }
}


/// A convenience macro-free constructor used pervasively in tests.
#[inline]
pub fn sq(notation: &str) -> SquareLocation {
    notation.parse().expect("valid square notation")
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("a1", 0, 0)]
    #[test_case("e4", 4, 3)]
    #[test_case("h8", 7, 7)]
    fn parses_valid_squares(s: &str, file: File, rank: Rank) {
        let loc: SquareLocation = s.parse().unwrap();
        assert_eq!(loc.file(), file);
        assert_eq!(loc.rank(), rank);
        assert_eq!(loc.to_string(), s);
    }

    #[test_case("")]
    #[test_case("e")]
    #[test_case("e9")]
    #[test_case("i4")]
    #[test_case("e44")]
    #[test_case("E4")]
    fn rejects_invalid_squares(s: &str) {
        assert!(s.parse::<SquareLocation>().is_err());
    }

    #[test]
    fn index_round_trip() {
        for loc in SquareLocation::all() {
            assert_eq!(SquareLocation::from_index(loc.index()), loc);
        }
    }

    #[test]
    fn square_colors() {
        assert!(sq("a1").is_dark());
        assert!(!sq("h1").is_dark());
        assert!(!sq("c8").is_dark());
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(SquareLocation::new(8, 0).is_none());
        assert!(SquareLocation::new(0, 8).is_none());
        assert!(sq("a8").offset(0, 1).is_none());
        assert_eq!(sq("e4").offset(1, 1), Some(sq("f5")));
    }
}
