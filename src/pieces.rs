//! Defines piece kinds, colors, and the per-variant attack geometry.

use std::fmt;

use crate::squares::SquareLocation;
use crate::value::Value;


/// `White` or `Black`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns `0` for White, `1` for Black. Used to index per-color
    /// arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The rank direction in which this side's pawns advance.
    #[inline]
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The rank on which this side's pawns start.
    #[inline]
    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// The rank on which this side's pawns promote.
    #[inline]
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// The rank on which this side's pieces start (the back rank).
    #[inline]
    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Color::White => "White",
            Color::Black => "Black",
        })
    }
}


/// The closed set of piece variants.
///
/// Each variant carries its own attack geometry, exposed through the
/// dispatch methods below (`slider_directions`, `is_long_ranged`,
/// and the fixed-delta tables). The board walks the geometry against
/// its occupancy; the variant set itself never grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King = 0,
    Queen = 1,
    Rook = 2,
    Bishop = 3,
    Knight = 4,
    Pawn = 5,
}

/// Orthogonal step deltas.
pub const STRAIGHT_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Diagonal step deltas.
pub const DIAGONAL_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// All eight step deltas, used by kings and queens.
pub const ALL_DIRECTIONS: [(i8, i8); 8] = [(1, 0), (-1, 0), (0, 1), (0, -1),
                                           (1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Knight jump deltas.
pub const KNIGHT_JUMPS: [(i8, i8); 8] = [(1, 2), (2, 1), (2, -1), (1, -2),
                                         (-1, -2), (-2, -1), (-2, 1), (-1, 2)];

impl PieceKind {
    /// Returns whether the piece attacks along open lines (queen,
    /// rook, bishop).
    ///
    /// Long-ranged pieces take part in the open-line/block-line
    /// menace bookkeeping: their attacks must be extended when a
    /// square on their line is vacated, and truncated when one is
    /// occupied.
    #[inline]
    pub fn is_long_ranged(self) -> bool {
        matches!(self, PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop)
    }

    /// The ray directions of a long-ranged piece, or an empty slice.
    #[inline]
    pub fn slider_directions(self) -> &'static [(i8, i8)] {
        match self {
            PieceKind::Queen => &ALL_DIRECTIONS,
            PieceKind::Rook => &STRAIGHT_DIRECTIONS,
            PieceKind::Bishop => &DIAGONAL_DIRECTIONS,
            _ => &[],
        }
    }

    /// Returns whether a long-ranged piece of this kind attacks along
    /// the given unit direction.
    #[inline]
    pub fn attacks_along(self, direction: (i8, i8)) -> bool {
        let straight = direction.0 == 0 || direction.1 == 0;
        match self {
            PieceKind::Queen => true,
            PieceKind::Rook => straight,
            PieceKind::Bishop => !straight,
            _ => false,
        }
    }

    /// The FEN letter of the piece ('K', 'q', ..), upper-case for
    /// White.
    pub fn fen_char(self, color: Color) -> char {
        let c = match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parses a FEN letter into a (kind, color) pair.
    pub fn from_fen_char(c: char) -> Option<(PieceKind, Color)> {
        let kind = match c.to_ascii_lowercase() {
            'k' => PieceKind::King,
            'q' => PieceKind::Queen,
            'r' => PieceKind::Rook,
            'b' => PieceKind::Bishop,
            'n' => PieceKind::Knight,
            'p' => PieceKind::Pawn,
            _ => return None,
        };
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some((kind, color))
    }
}


/// A table of piece values in centipawns, indexed by `PieceKind`.
pub type PieceValueTable = [Value; 6];

/// The conventional material values (the king's value is only used to
/// cap exchange sequences, it never enters a material sum).
pub const STANDARD_PIECE_VALUES: PieceValueTable = [10000, 975, 500, 325, 325, 100];


/// Identifies a piece within its board's piece list.
///
/// A piece is created once per game (promotion creates a *new*
/// piece; the promoted pawn is removed, not transformed) and keeps
/// its identity until the game is cleared. Captured pieces stay in
/// the list with no square, so that undoing the capture can restore
/// the very same piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PieceId(pub(crate) u16);

impl PieceId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}


/// A piece, as recorded in a board's piece list.
#[derive(Clone, Copy, Debug)]
pub struct Piece {
    pub id: PieceId,
    pub kind: PieceKind,
    pub color: Color,

    /// The square the piece stands on, or `None` if the piece has
    /// been captured or removed by promotion.
    pub square: Option<SquareLocation>,

    /// The half-move number at which the piece moved for the first
    /// time, or `0` if it has never moved. Castling and double pawn
    /// pushes are legal only for pieces that have never moved.
    pub first_move_ply: u16,
}

impl Piece {
    #[inline]
    pub fn is_on_board(&self) -> bool {
        self.square.is_some()
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.first_move_ply != 0
    }
}


/// Returns the unit step from `a` to `b` if they share a rank, file,
/// or diagonal, and are not the same square.
#[inline]
pub fn direction_between(a: SquareLocation, b: SquareLocation) -> Option<(i8, i8)> {
    let df = b.file() as i8 - a.file() as i8;
    let dr = b.rank() as i8 - a.rank() as i8;
    if df == 0 && dr == 0 {
        None
    } else if df == 0 || dr == 0 || df.abs() == dr.abs() {
        Some((df.signum(), dr.signum()))
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::sq;

    #[test]
    fn geometry_dispatch() {
        assert!(PieceKind::Queen.is_long_ranged());
        assert!(!PieceKind::Knight.is_long_ranged());
        assert_eq!(PieceKind::Rook.slider_directions().len(), 4);
        assert_eq!(PieceKind::Queen.slider_directions().len(), 8);
        assert!(PieceKind::Bishop.attacks_along((1, 1)));
        assert!(!PieceKind::Bishop.attacks_along((1, 0)));
        assert!(!PieceKind::Knight.attacks_along((1, 0)));
    }

    #[test]
    fn directions_between_squares() {
        assert_eq!(direction_between(sq("a1"), sq("a8")), Some((0, 1)));
        assert_eq!(direction_between(sq("h8"), sq("a1")), Some((-1, -1)));
        assert_eq!(direction_between(sq("a1"), sq("b3")), None);
        assert_eq!(direction_between(sq("e4"), sq("e4")), None);
    }

    #[test]
    fn fen_letters_round_trip() {
        for &kind in &[PieceKind::King, PieceKind::Queen, PieceKind::Rook,
                       PieceKind::Bishop, PieceKind::Knight, PieceKind::Pawn] {
            for &color in &[Color::White, Color::Black] {
                let c = kind.fen_char(color);
                assert_eq!(PieceKind::from_fen_char(c), Some((kind, color)));
            }
        }
        assert_eq!(PieceKind::from_fen_char('x'), None);
    }
}
