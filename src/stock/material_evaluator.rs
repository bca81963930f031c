//! Implements `MaterialEvaluator`.

use crate::board::ChessBoard;
use crate::pieces::{Color, PieceKind, PieceValueTable, STANDARD_PIECE_VALUES};
use crate::search::Evaluator;
use crate::squares::SquareLocation;
use crate::value::Value;


/// A material-counting evaluator with a capture-settling correction.
///
/// The base score is the sum of piece values from White's point of
/// view. On top of it, the evaluator settles the captures available
/// to the side to move: it tries every capture, lets the opponent
/// recapture on the same square with their least valuable attacker,
/// and so on until one side declines, then credits the best net gain
/// to the side to move. Without this pass a position would be
/// mis-scored purely because a profitable capture has not been played
/// out yet.
///
/// Exchanges are played out on the board with real moves and undone
/// afterwards, so pins and every other legality constraint are
/// honored exactly.
pub struct MaterialEvaluator {
    values: PieceValueTable,
}

impl MaterialEvaluator {
    /// Creates an evaluator with the conventional piece values.
    pub fn new() -> MaterialEvaluator {
        MaterialEvaluator { values: STANDARD_PIECE_VALUES }
    }

    /// Creates an evaluator with a custom piece-value table.
    pub fn with_values(values: PieceValueTable) -> MaterialEvaluator {
        MaterialEvaluator { values }
    }

    #[inline]
    fn value_of(&self, kind: PieceKind) -> Value {
        self.values[kind as usize]
    }

    /// The best net material the side to move can force by initiating
    /// a capture, never negative (the side may always decline).
    fn best_exchange(&self, board: &mut ChessBoard) -> Value {
        let mut best = 0;
        for m in board.legal_moves() {
            let victim = match m.captured {
                Some((_, kind)) => kind,
                None => continue,
            };
            // Recompose instead of reusing `m`: the board's version
            // has moved on after the first exchange tried.
            let played = match board.play(m.from, m.to, m.promotion) {
                Ok(played) => played,
                Err(_) => continue,
            };
            let reply = self.settle_on(board, played.to);
            board.undo_move();
            let gain = self.value_of(victim) - reply;
            if gain > best {
                best = gain;
            }
        }
        best
    }

    /// The net material the side to move can win by recapturing on
    /// one square, using its least valuable attacker first. Never
    /// negative.
    fn settle_on(&self, board: &mut ChessBoard, square: SquareLocation) -> Value {
        let recapture = board.legal_moves()
            .into_iter()
            .filter(|m| m.to == square && m.captured.is_some())
            .min_by_key(|m| self.value_of(m.kind));
        let m = match recapture {
            Some(m) => m,
            None => return 0,
        };
        let victim = m.captured.map(|(_, kind)| kind).expect("the filter kept captures only");
        match board.play(m.from, m.to, m.promotion) {
            Ok(_) => {}
            Err(_) => return 0,
        }
        let reply = self.settle_on(board, square);
        board.undo_move();
        (self.value_of(victim) - reply).max(0)
    }
}

impl Default for MaterialEvaluator {
    fn default() -> MaterialEvaluator {
        MaterialEvaluator::new()
    }
}

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, board: &mut ChessBoard) -> Value {
        let mut total = 0;
        for (_, kind, color) in board.position().occupied() {
            if kind == PieceKind::King {
                continue;
            }
            match color {
                Color::White => total += self.value_of(kind),
                Color::Black => total -= self.value_of(kind),
            }
        }
        let gain = self.best_exchange(board);
        match board.to_move() {
            Color::White => total + gain,
            Color::Black => total - gain,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn evaluate(fen: &str) -> Value {
        let mut board = ChessBoard::new();
        board.set_position_from_fen(fen).unwrap();
        MaterialEvaluator::new().evaluate(&mut board)
    }

    #[test]
    fn the_starting_position_is_balanced() {
        let mut board = ChessBoard::new();
        board.new_game();
        assert_eq!(MaterialEvaluator::new().evaluate(&mut board), 0);
    }

    #[test]
    fn an_extra_pawn_counts() {
        assert_eq!(evaluate("4k3/pppp4/8/8/8/8/PPPPP3/4K3 w"), 100);
        assert_eq!(evaluate("4k3/pppp4/8/8/8/8/PPPPP3/4K3 b"), 100);
    }

    #[test]
    fn a_hanging_piece_is_counted_as_captured() {
        // White queen on d1, undefended black knight on d5.
        assert_eq!(evaluate("4k3/8/8/3n4/8/8/8/3QK3 w"), 975 - 325 + 325);
    }

    #[test]
    fn a_defended_piece_is_not_worth_taking() {
        // The knight on d5 is guarded by the pawn on e6; trading the
        // queen for it would lose material, so the exchange pass
        // leaves the score alone.
        assert_eq!(evaluate("4k3/8/4p3/3n4/8/8/8/3QK3 w"), 975 - 325 - 100);
    }

    #[test]
    fn custom_piece_values_are_honored() {
        let mut board = ChessBoard::new();
        board.set_position_from_fen("4k3/8/8/8/8/8/8/N3K3 w").unwrap();
        let mut values = STANDARD_PIECE_VALUES;
        values[PieceKind::Knight as usize] = 400;
        assert_eq!(MaterialEvaluator::with_values(values).evaluate(&mut board),
                   400);
    }
}
