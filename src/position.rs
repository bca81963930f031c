//! Defines `GamePosition` -- a comparable snapshot of a position.

use std::fmt;
use std::str::FromStr;

use crate::errors::NotationError;
use crate::pieces::{Color, PieceKind};
use crate::squares::SquareLocation;


/// A snapshot of the piece placement plus the side to move.
///
/// Two positions are equal if and only if their placements and their
/// sides to move match exactly. Snapshots are what the board's
/// position history is made of, so this equality is also the equality
/// used by the threefold-repetition rule. A snapshot carries no
/// knowledge of castling availability or en-passant rights -- those
/// are reconstructed from the pieces' first-move counters and the
/// move history when a snapshot is loaded onto a board.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GamePosition {
    placement: [Option<(PieceKind, Color)>; 64],
    to_move: Color,
}

impl GamePosition {
    /// Creates an empty position with White to move.
    pub fn empty() -> GamePosition {
        GamePosition {
            placement: [None; 64],
            to_move: Color::White,
        }
    }

    /// Creates the standard starting position.
    pub fn standard() -> GamePosition {
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"
            .parse()
            .unwrap()
    }

    #[inline]
    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn set_to_move(&mut self, color: Color) {
        self.to_move = color;
    }

    #[inline]
    pub fn at(&self, location: SquareLocation) -> Option<(PieceKind, Color)> {
        self.placement[location.index()]
    }

    /// Puts a piece on a square (replacing whatever was there), or
    /// clears the square when `piece` is `None`.
    pub fn set(&mut self, location: SquareLocation, piece: Option<(PieceKind, Color)>) {
        self.placement[location.index()] = piece;
    }

    /// Iterates over the occupied squares.
    pub fn occupied(&self) -> impl Iterator<Item = (SquareLocation, PieceKind, Color)> + '_ {
        self.placement
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|(kind, color)| (SquareLocation::from_index(i), kind, color)))
    }
}

impl FromStr for GamePosition {
    type Err = NotationError;

    /// Parses the first two fields of a FEN string: the piece
    /// placement and the active color.
    ///
    /// The placement describes the board starting at a8 and going
    /// toward h1: each rank lists its pieces by FEN letter ("PNBRQK"
    /// for White, "pnbrqk" for Black), runs of blank squares by a
    /// digit, and "/" separates ranks. The active color is "w" or
    /// "b". Any further FEN fields (castling, en-passant, clocks)
    /// are ignored -- a snapshot does not carry them.
    fn from_str(s: &str) -> Result<GamePosition, NotationError> {
        let fields: Vec<_> = s.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(NotationError);
        }
        let mut position = GamePosition::empty();
        parse_placement(fields[0], &mut position)?;
        position.to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(NotationError),
        };
        Ok(position)
    }
}

fn parse_placement(s: &str, position: &mut GamePosition) -> Result<(), NotationError> {
    // FEN describes the board starting at a8 and going toward h1.
    let mut file = 0u8;
    let mut rank = 7u8;

    for c in s.chars() {
        match c {
            '/' => {
                if file == 8 && rank > 0 {
                    file = 0;
                    rank -= 1;
                } else {
                    return Err(NotationError);
                }
            }
            n @ '1'..='8' => {
                file += n as u8 - b'0';
                if file > 8 {
                    return Err(NotationError);
                }
            }
            _ => {
                let piece = PieceKind::from_fen_char(c).ok_or(NotationError)?;
                if file > 7 {
                    return Err(NotationError);
                }
                let location = SquareLocation::new(file, rank).unwrap();
                position.set(location, Some(piece));
                file += 1;
            }
        }
    }

    // Ensure the placement field had the right length.
    if file == 8 && rank == 0 {
        Ok(())
    } else {
        Err(NotationError)
    }
}

impl fmt::Display for GamePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for rank in (0..8).rev() {
            s.push('\n');
            for file in 0..8 {
                let location = SquareLocation::new(file, rank).unwrap();
                s.push(match self.at(location) {
                    Some((kind, color)) => kind.fen_char(color),
                    None => '.',
                });
            }
        }
        writeln!(f, "{}", s)?;
        writeln!(f, "{} to move", self.to_move)
    }
}

impl fmt::Debug for GamePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
