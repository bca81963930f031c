//! Defines data structures related to chess moves.

use std::fmt;

use crate::pieces::{Color, PieceId, PieceKind};
use crate::squares::SquareLocation;


/// `Queenside` or `Kingside`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastlingSide {
    Queenside,
    Kingside,
}

impl CastlingSide {
    /// The file on which the castling rook starts.
    #[inline]
    pub fn rook_file(self) -> u8 {
        match self {
            CastlingSide::Queenside => 0,
            CastlingSide::Kingside => 7,
        }
    }

    /// The file the king ends up on.
    #[inline]
    pub fn king_destination_file(self) -> u8 {
        match self {
            CastlingSide::Queenside => 2,
            CastlingSide::Kingside => 6,
        }
    }

    /// The file the rook ends up on.
    #[inline]
    pub fn rook_destination_file(self) -> u8 {
        match self {
            CastlingSide::Queenside => 3,
            CastlingSide::Kingside => 5,
        }
    }

    /// The files that must be empty between king and rook.
    #[inline]
    pub fn vacant_files(self) -> &'static [u8] {
        match self {
            CastlingSide::Queenside => &[1, 2, 3],
            CastlingSide::Kingside => &[5, 6],
        }
    }

    /// The files the king transits or lands on, which must not be
    /// attacked.
    #[inline]
    pub fn safe_files(self) -> &'static [u8] {
        match self {
            CastlingSide::Queenside => &[3, 2],
            CastlingSide::Kingside => &[5, 6],
        }
    }
}


/// Represents one ply on the chessboard.
///
/// A `Move` contains three kinds of information: the played move
/// itself, everything needed to undo it and restore the board into
/// the exact same state as before, and the version of the board it
/// was built against. A move is immutable once constructed, and is
/// rejected at apply time if the board's version has changed since --
/// this prevents applying a stale move to a board that was mutated in
/// the meantime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    /// The piece being moved. For castling this is the king; for
    /// promotions this is the pawn.
    pub piece: PieceId,

    /// The kind of the moved piece at the time of the move.
    pub kind: PieceKind,

    /// The side that makes the move.
    pub color: Color,

    pub from: SquareLocation,
    pub to: SquareLocation,

    /// The captured piece, if any. For en-passant captures the piece
    /// does not stand on `to`.
    pub captured: Option<(PieceId, PieceKind)>,

    /// The kind the pawn promotes to, if the move is a promotion.
    pub promotion: Option<PieceKind>,

    /// `true` if the move is an en-passant capture.
    pub en_passant: bool,

    /// The castling side, if the move is a castling move.
    pub castling: Option<CastlingSide>,

    /// `true` if the moved piece had never moved before. Undo uses
    /// this to restore the piece's first-move counter.
    pub first_move: bool,

    /// The board version the move was built against.
    pub version: u64,
}

impl Move {
    /// Returns whether the move captures a piece or advances a pawn
    /// (the moves that reset the fifty-move counter and cut off the
    /// repetition history).
    #[inline]
    pub fn is_pawn_advance_or_capture(&self) -> bool {
        self.kind == PieceKind::Pawn || self.captured.is_some()
    }

    /// The square the captured piece stood on. Differs from `to` only
    /// for en-passant captures.
    #[inline]
    pub fn capture_square(&self) -> Option<SquareLocation> {
        self.captured.map(|_| {
            if self.en_passant {
                SquareLocation::new(self.to.file(), self.from.rank()).unwrap()
            } else {
                self.to
            }
        })
    }

    /// Returns the move in coordinate notation (`"e2e4"`, `"e7e8q"`).
    pub fn notation(&self) -> String {
        match self.promotion {
            Some(kind) => format!("{}{}{}", self.from, self.to, kind.fen_char(Color::Black)),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.notation())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::sq;

    fn stub_move(from: &str, to: &str, promotion: Option<PieceKind>) -> Move {
        Move {
            piece: PieceId(0),
            kind: if promotion.is_some() {
                PieceKind::Pawn
            } else {
                PieceKind::Knight
            },
            color: Color::White,
            from: sq(from),
            to: sq(to),
            captured: None,
            promotion,
            en_passant: false,
            castling: None,
            first_move: true,
            version: 0,
        }
    }

    #[test]
    fn coordinate_notation() {
        assert_eq!(stub_move("g1", "f3", None).notation(), "g1f3");
        assert_eq!(stub_move("e7", "e8", Some(PieceKind::Queen)).notation(),
                   "e7e8q");
        assert_eq!(stub_move("a7", "a8", Some(PieceKind::Knight)).notation(),
                   "a7a8n");
    }

    #[test]
    fn en_passant_capture_square() {
        let mut m = stub_move("e5", "d6", None);
        m.kind = PieceKind::Pawn;
        m.captured = Some((PieceId(9), PieceKind::Pawn));
        m.en_passant = true;
        assert_eq!(m.capture_square(), Some(sq("d5")));
        m.en_passant = false;
        assert_eq!(m.capture_square(), Some(sq("d6")));
    }

    #[test]
    fn castling_files() {
        assert_eq!(CastlingSide::Kingside.king_destination_file(), 6);
        assert_eq!(CastlingSide::Queenside.rook_destination_file(), 3);
        assert_eq!(CastlingSide::Queenside.vacant_files(), &[1, 2, 3]);
        assert_eq!(CastlingSide::Kingside.safe_files(), &[5, 6]);
    }
}
