//! Defines the error types used throughout the crate.
//!
//! Rule violations are recoverable: the board refuses the operation,
//! leaves its state untouched, and surfaces a typed failure so that
//! the caller can decide whether to re-prompt. Programming errors
//! (malformed setup input, undoing a game with no moves played) are
//! not represented here -- they panic.

use thiserror::Error;


/// The reasons for which a move can be refused.
///
/// `PromotionNotChosen` is deliberately distinguished from
/// illegality: it signals "this move would otherwise be legal, supply
/// a promotion piece". The caller is expected to choose a piece kind
/// and re-invoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    /// The destination is not reachable by the piece under the
    /// current rules.
    #[error("the move is illegal")]
    Illegal,

    /// The move would leave or place the moving side's own king in
    /// check.
    #[error("the move would expose the king to check")]
    ExposedKing,

    /// The piece is pinned and the move leaves the pin line.
    #[error("the piece is pinned to the king")]
    PinnedPiece,

    /// Castling is no longer available because the king or the
    /// relevant rook has already moved.
    #[error("castling has been forfeited")]
    CastlingForfeited,

    /// The king is in check, or its path crosses or lands on an
    /// attacked square.
    #[error("castling passes through or ends on an attacked square")]
    CastlingPathAttacked,

    /// The pawn reaches the last rank and no promotion piece kind was
    /// supplied.
    #[error("a promotion piece has not been chosen")]
    PromotionNotChosen,

    /// The move was built against an older version of the board.
    #[error("stale move: built against board version {move_version}, \
             the board is now at version {board_version}")]
    StaleMove {
        move_version: u64,
        board_version: u64,
    },

    /// The board holds no game in progress.
    #[error("no game is in progress")]
    NoGame,
}


/// The ways a search can end without producing a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The cooperative cancellation flag was observed during tree
    /// traversal. The partial result has been discarded.
    #[error("the search was interrupted")]
    Interrupted,

    /// The root position has no legal moves (the game is over).
    #[error("the position has no legal moves")]
    NoLegalMove,

    /// The live board was mutated while the search was running, so
    /// the chosen move would apply to the wrong position.
    #[error("the position changed during the search")]
    PositionChanged,
}


/// Represents an error in textual notation (square names, FEN
/// fields).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("invalid notation")]
pub struct NotationError;
