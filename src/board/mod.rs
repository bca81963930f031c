//! Implements `ChessBoard` -- the rules engine.
//!
//! The board owns the square grid, the piece list, the move and
//! position history, and the game status. It exposes three mutating
//! entry points (`set_position`, `make_move`, `undo_move`), all of
//! which keep every invariant intact or fail without touching
//! anything, and it stamps a monotonically increasing version on
//! every mutation so that stale moves and concurrent observers can
//! be detected cheaply.

mod grid;
mod legality;

use std::fmt;
use std::sync::Arc;

use crate::errors::{MoveError, NotationError};
use crate::moves::Move;
use crate::pieces::{Color, Piece, PieceId, PieceKind};
use crate::position::GamePosition;
use crate::squares::SquareLocation;

use self::grid::SquareGrid;


/// The reason a game ended in a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    Repetition,
    FiftyMoves,
}


/// The state of the game on a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    /// The board is empty (freshly created or cleared).
    NoGame,

    /// The last position setup failed validation.
    IllegalPosition,

    InProgress,
    WhiteWins,
    BlackWins,
    Draw(DrawReason),
}


/// Receives a notification after every successfully applied move.
///
/// Observers registered on a live board are *not* carried over to
/// clones: a search works on a private copy of the board, and the
/// thousands of moves it plays out must stay silent.
pub trait BoardObserver: Send + Sync {
    fn move_completed(&self, board: &ChessBoard, played: &Move);
}


/// A chessboard with incremental attack bookkeeping, move history,
/// and status tracking.
pub struct ChessBoard {
    grid: SquareGrid,
    pieces: Vec<Piece>,
    kings: [Option<PieceId>; 2],
    to_move: Color,

    /// The square a pawn may currently capture onto en passant.
    en_passant: Option<SquareLocation>,

    moves: Vec<Move>,

    /// One snapshot per position reached, the current position last.
    /// Feeds the threefold-repetition rule.
    snapshots: Vec<GamePosition>,

    /// Half-moves since the last capture or pawn advance.
    idle_halfmoves: u16,

    status: GameStatus,
    version: u64,
    observers: Vec<Arc<dyn BoardObserver>>,
}

impl ChessBoard {
    /// Creates an empty board (status `NoGame`).
    pub fn new() -> ChessBoard {
        ChessBoard {
            grid: SquareGrid::new(),
            pieces: Vec::new(),
            kings: [None, None],
            to_move: Color::White,
            en_passant: None,
            moves: Vec::new(),
            snapshots: Vec::new(),
            idle_halfmoves: 0,
            status: GameStatus::NoGame,
            version: 1,
            observers: Vec::new(),
        }
    }

    /// Empties the board. The version advances, so every previously
    /// composed move becomes stale.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.pieces.clear();
        self.kings = [None, None];
        self.to_move = Color::White;
        self.en_passant = None;
        self.moves.clear();
        self.snapshots.clear();
        self.idle_halfmoves = 0;
        self.status = GameStatus::NoGame;
        self.version += 1;
    }

    /// Sets up the given position and computes the initial status.
    ///
    /// A position failing validation (missing or duplicate kings,
    /// pawns on a back rank, the side not to move left in check) does
    /// not raise an error -- the board takes the placement but marks
    /// itself `IllegalPosition`, and refuses moves until a valid
    /// setup replaces it.
    pub fn set_position(&mut self, position: &GamePosition) {
        self.clear();
        let mut duplicate_king = false;
        for (square, kind, color) in position.occupied() {
            let id = PieceId(self.pieces.len() as u16);
            self.pieces.push(Piece {
                id,
                kind,
                color,
                square: None,
                first_move_ply: 0,
            });
            self.grid.drop_piece(&mut self.pieces, id, square);
            if kind == PieceKind::King {
                if self.kings[color.index()].is_some() {
                    duplicate_king = true;
                }
                self.kings[color.index()] = Some(id);
            }
        }
        self.grid.finish_mutation();
        self.to_move = position.to_move();

        if duplicate_king || !self.setup_is_valid() {
            self.status = GameStatus::IllegalPosition;
            return;
        }
        self.status = GameStatus::InProgress;
        self.snapshots.push(self.position());
        self.status = self.compute_status();
    }

    /// Sets up the position described by a FEN string (only the
    /// placement and active-color fields are used).
    pub fn set_position_from_fen(&mut self, fen: &str) -> Result<(), NotationError> {
        let position: GamePosition = fen.parse()?;
        self.set_position(&position);
        Ok(())
    }

    /// Sets up the standard starting position.
    pub fn new_game(&mut self) {
        self.set_position(&GamePosition::standard());
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[inline]
    pub fn to_move(&self) -> Color {
        self.to_move
    }

    /// The board's version stamp. Incremented on every mutation
    /// (clear, setup, move, undo); moves composed against an older
    /// version are refused.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The piece standing on a square, if any.
    #[inline]
    pub fn piece_at(&self, location: SquareLocation) -> Option<(PieceKind, Color)> {
        self.grid
            .occupant(location)
            .map(|id| (self.pieces[id.index()].kind, self.pieces[id.index()].color))
    }

    /// The moves played so far, oldest first.
    #[inline]
    pub fn move_history(&self) -> &[Move] {
        &self.moves
    }

    #[inline]
    pub fn last_move(&self) -> Option<&Move> {
        self.moves.last()
    }

    /// Half-moves played since the last capture or pawn advance.
    #[inline]
    pub fn idle_halfmoves(&self) -> u16 {
        self.idle_halfmoves
    }

    /// A snapshot of the current placement and side to move.
    pub fn position(&self) -> GamePosition {
        let mut position = GamePosition::empty();
        for piece in self.pieces.iter() {
            if let Some(square) = piece.square {
                position.set(square, Some((piece.kind, piece.color)));
            }
        }
        position.set_to_move(self.to_move);
        position
    }

    /// Registers an observer to be notified after every applied move.
    pub fn add_observer(&mut self, observer: Arc<dyn BoardObserver>) {
        self.observers.push(observer);
    }

    /// Composes and applies a move in one call. This is the entry
    /// point a host uses to play a move given two squares and,
    /// conditionally, a promotion piece kind.
    pub fn play(&mut self,
                from: SquareLocation,
                to: SquareLocation,
                promotion: Option<PieceKind>)
                -> Result<Move, MoveError> {
        let m = self.compose_move(from, to, promotion)?;
        self.make_move(m)?;
        Ok(m)
    }

    /// Applies a previously composed move.
    ///
    /// The transition is atomic: the move is re-verified against the
    /// current position (including its version stamp) before anything
    /// is touched, so a failed call leaves the board exactly as it
    /// was.
    pub fn make_move(&mut self, m: Move) -> Result<(), MoveError> {
        if self.status != GameStatus::InProgress {
            return Err(MoveError::NoGame);
        }
        if m.version != self.version {
            return Err(MoveError::StaleMove {
                move_version: m.version,
                board_version: self.version,
            });
        }
        let expected = self.compose_move(m.from, m.to, m.promotion)?;
        if expected != m {
            return Err(MoveError::Illegal);
        }
        self.apply_move(&m);

        if !self.observers.is_empty() {
            let observers = self.observers.clone();
            for observer in observers.iter() {
                observer.move_completed(self, &m);
            }
        }
        Ok(())
    }

    /// Takes back the last move, restoring the board to the exact
    /// state it had before the move was applied.
    ///
    /// # Panics
    ///
    /// Panics if no moves have been played. Undoing an empty history
    /// is a programming error, not a rule violation.
    pub fn undo_move(&mut self) -> Move {
        let m = self.moves.pop().expect("undo_move with no moves played");

        if let Some(side) = m.castling {
            let back_rank = m.color.back_rank();
            let rook_to = SquareLocation::new(side.rook_destination_file(), back_rank).unwrap();
            let rook_from = SquareLocation::new(side.rook_file(), back_rank).unwrap();
            let rook = self.grid.lift_piece(&mut self.pieces, rook_to);
            self.grid.drop_piece(&mut self.pieces, rook, rook_from);
            self.pieces[rook.index()].first_move_ply = 0;
        }
        match m.promotion {
            Some(_) => {
                // The promoted piece is the newest piece in the list,
                // because promotions always push and undos always pop
                // in reverse order.
                let promoted = self.grid.lift_piece(&mut self.pieces, m.to);
                assert_eq!(promoted.index(),
                           self.pieces.len() - 1,
                           "undo out of order: the promoted piece is not the newest");
                self.pieces.pop();
                self.grid.drop_piece(&mut self.pieces, m.piece, m.from);
            }
            None => {
                let mover = self.grid.lift_piece(&mut self.pieces, m.to);
                debug_assert!(mover == m.piece);
                self.grid.drop_piece(&mut self.pieces, m.piece, m.from);
            }
        }
        if m.first_move {
            self.pieces[m.piece.index()].first_move_ply = 0;
        }
        if let Some(square) = m.capture_square() {
            let (victim, _) = m.captured.expect("capture_square implies a captured piece");
            self.grid.drop_piece(&mut self.pieces, victim, square);
        }
        self.grid.finish_mutation();

        self.snapshots.pop();
        self.to_move = m.color;
        self.en_passant = self.moves.last().copied().and_then(passed_over_square);
        self.idle_halfmoves = self.recompute_idle_halfmoves();
        self.status = GameStatus::InProgress;
        self.version += 1;
        m
    }

    fn apply_move(&mut self, m: &Move) {
        let ply = (self.moves.len() + 1) as u16;

        if let Some(square) = m.capture_square() {
            let (victim, _) = m.captured.expect("capture_square implies a captured piece");
            let lifted = self.grid.lift_piece(&mut self.pieces, square);
            debug_assert!(lifted == victim);
        }
        let mover = self.grid.lift_piece(&mut self.pieces, m.from);
        debug_assert!(mover == m.piece);
        match m.promotion {
            Some(kind) => {
                // Promotion removes the pawn and creates a new piece.
                let id = PieceId(self.pieces.len() as u16);
                self.pieces.push(Piece {
                    id,
                    kind,
                    color: m.color,
                    square: None,
                    first_move_ply: ply,
                });
                self.grid.drop_piece(&mut self.pieces, id, m.to);
            }
            None => {
                self.grid.drop_piece(&mut self.pieces, m.piece, m.to);
            }
        }
        if let Some(side) = m.castling {
            let back_rank = m.color.back_rank();
            let rook_from = SquareLocation::new(side.rook_file(), back_rank).unwrap();
            let rook_to = SquareLocation::new(side.rook_destination_file(), back_rank).unwrap();
            let rook = self.grid.lift_piece(&mut self.pieces, rook_from);
            self.grid.drop_piece(&mut self.pieces, rook, rook_to);
            self.pieces[rook.index()].first_move_ply = ply;
        }
        if m.first_move {
            self.pieces[m.piece.index()].first_move_ply = ply;
        }
        self.grid.finish_mutation();

        self.en_passant = passed_over_square(*m);
        self.idle_halfmoves = if m.is_pawn_advance_or_capture() {
            0
        } else {
            self.idle_halfmoves + 1
        };
        self.to_move = m.color.opponent();
        self.moves.push(*m);
        self.snapshots.push(self.position());
        self.version += 1;
        self.status = self.compute_status();
    }

    fn setup_is_valid(&mut self) -> bool {
        if self.kings[0].is_none() || self.kings[1].is_none() {
            return false;
        }
        for piece in self.pieces.iter() {
            if piece.kind == PieceKind::Pawn {
                if let Some(square) = piece.square {
                    if square.rank() == 0 || square.rank() == 7 {
                        return false;
                    }
                }
            }
        }
        // The side to move may not be able to capture the enemy king.
        let waiting = self.to_move.opponent();
        let waiting_king = self.king_square(waiting);
        !self.grid.is_attacked(&self.pieces, waiting_king, self.to_move)
    }

    fn compute_status(&mut self) -> GameStatus {
        if !self.has_any_legal_move() {
            return if self.in_check() {
                match self.to_move {
                    Color::White => GameStatus::BlackWins,
                    Color::Black => GameStatus::WhiteWins,
                }
            } else {
                GameStatus::Draw(DrawReason::Stalemate)
            };
        }
        if self.insufficient_material() {
            return GameStatus::Draw(DrawReason::InsufficientMaterial);
        }
        if self.idle_halfmoves >= 100 {
            return GameStatus::Draw(DrawReason::FiftyMoves);
        }
        if self.position_repeated_thrice() {
            return GameStatus::Draw(DrawReason::Repetition);
        }
        GameStatus::InProgress
    }

    /// Neither side can possibly deliver checkmate: no pawns, queens,
    /// or rooks remain, and the minor pieces left cannot combine (no
    /// knight alongside a bishop, no bishops on both square colors).
    fn insufficient_material(&self) -> bool {
        let mut knights = 0;
        let mut dark_bishops = false;
        let mut light_bishops = false;
        for piece in self.pieces.iter() {
            let square = match piece.square {
                Some(square) => square,
                None => continue,
            };
            match piece.kind {
                PieceKind::Pawn | PieceKind::Queen | PieceKind::Rook => return false,
                PieceKind::Knight => knights += 1,
                PieceKind::Bishop => {
                    if square.is_dark() {
                        dark_bishops = true;
                    } else {
                        light_bishops = true;
                    }
                }
                PieceKind::King => {}
            }
        }
        if dark_bishops && light_bishops {
            return false;
        }
        if knights > 0 && (dark_bishops || light_bishops) {
            return false;
        }
        true
    }

    /// The current position has occurred three times. Only snapshots
    /// within the fifty-move window can repeat, so the scan is
    /// bounded by the idle-halfmove counter.
    fn position_repeated_thrice(&self) -> bool {
        let current = match self.snapshots.last() {
            Some(snapshot) => snapshot,
            None => return false,
        };
        let window = self.idle_halfmoves as usize + 1;
        self.snapshots
            .iter()
            .rev()
            .take(window)
            .filter(|s| *s == current)
            .count() >= 3
    }

    /// The idle counter cannot be popped off a stack on undo because
    /// it is not stored per move; it is recomputed by scanning the
    /// history back to the last capture or pawn advance.
    fn recompute_idle_halfmoves(&self) -> u16 {
        let mut idle = 0;
        for m in self.moves.iter().rev() {
            if m.is_pawn_advance_or_capture() {
                break;
            }
            idle += 1;
        }
        idle
    }

    /// Verifies that every menace list agrees with a fresh scan.
    #[cfg(test)]
    pub(crate) fn assert_menaces_exact(&mut self) {
        let pieces = self.pieces.clone();
        self.grid.assert_menaces_exact(&pieces);
    }
}

impl Default for ChessBoard {
    fn default() -> ChessBoard {
        ChessBoard::new()
    }
}

/// Clones carry the full game state but not the observers: a clone is
/// an analysis copy, and the moves played on it stay silent.
impl Clone for ChessBoard {
    fn clone(&self) -> ChessBoard {
        ChessBoard {
            grid: self.grid.clone(),
            pieces: self.pieces.clone(),
            kings: self.kings,
            to_move: self.to_move,
            en_passant: self.en_passant,
            moves: self.moves.clone(),
            snapshots: self.snapshots.clone(),
            idle_halfmoves: self.idle_halfmoves,
            status: self.status,
            version: self.version,
            observers: Vec::new(),
        }
    }
}

impl fmt::Display for ChessBoard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.position(), f)
    }
}

impl fmt::Debug for ChessBoard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}


/// The square passed over by a double pawn push, which becomes the
/// en-passant capture square for the reply.
fn passed_over_square(m: Move) -> Option<SquareLocation> {
    if m.kind == PieceKind::Pawn && (m.to.rank() as i8 - m.from.rank() as i8).abs() == 2 {
        m.from.offset(0, m.color.pawn_direction())
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::sq;

    fn play(board: &mut ChessBoard, from: &str, to: &str) -> Move {
        board.play(sq(from), sq(to), None).unwrap()
    }

    #[test]
    fn menaces_stay_exact_through_a_game() {
        let mut board = ChessBoard::new();
        board.new_game();
        board.assert_menaces_exact();
        for (from, to) in [("e2", "e4"), ("d7", "d5"), ("e4", "d5"), ("d8", "d5"),
                           ("g1", "f3"), ("d5", "e4"), ("f1", "e2"), ("b8", "c6"),
                           ("e1", "g1")] {
            play(&mut board, from, to);
            board.assert_menaces_exact();
        }
        while board.last_move().is_some() {
            board.undo_move();
            board.assert_menaces_exact();
        }
    }

    #[test]
    fn kingside_castling_moves_the_rook() {
        let mut board = ChessBoard::new();
        board.new_game();
        for (from, to) in [("e2", "e4"), ("e7", "e5"), ("g1", "f3"), ("b8", "c6"),
                           ("f1", "c4"), ("g8", "f6")] {
            play(&mut board, from, to);
        }
        let castle = play(&mut board, "e1", "g1");
        assert!(castle.castling.is_some());
        assert_eq!(board.piece_at(sq("g1")), Some((PieceKind::King, Color::White)));
        assert_eq!(board.piece_at(sq("f1")), Some((PieceKind::Rook, Color::White)));
        assert_eq!(board.piece_at(sq("h1")), None);

        board.undo_move();
        assert_eq!(board.piece_at(sq("e1")), Some((PieceKind::King, Color::White)));
        assert_eq!(board.piece_at(sq("h1")), Some((PieceKind::Rook, Color::White)));
        assert_eq!(board.piece_at(sq("f1")), None);
        // Castling is available again after the undo.
        assert!(board.compose_move(sq("e1"), sq("g1"), None).is_ok());
    }

    #[test]
    fn en_passant_window_is_one_move() {
        let mut board = ChessBoard::new();
        board.new_game();
        for (from, to) in [("e2", "e4"), ("a7", "a6"), ("e4", "e5"), ("d7", "d5")] {
            play(&mut board, from, to);
        }
        let capture = board.compose_move(sq("e5"), sq("d6"), None).unwrap();
        assert!(capture.en_passant);
        assert_eq!(capture.capture_square(), Some(sq("d5")));

        // Playing something else first forfeits the capture.
        play(&mut board, "g1", "f3");
        play(&mut board, "g8", "f6");
        assert_eq!(board.compose_move(sq("e5"), sq("d6"), None),
                   Err(MoveError::Illegal));
    }

    #[test]
    fn promotion_requires_a_chosen_piece() {
        let mut board = ChessBoard::new();
        board.set_position_from_fen("8/2P5/8/8/8/4k3/8/4K3 w").unwrap();
        assert_eq!(board.compose_move(sq("c7"), sq("c8"), None),
                   Err(MoveError::PromotionNotChosen));
        let m = board.play(sq("c7"), sq("c8"), Some(PieceKind::Queen)).unwrap();
        assert_eq!(m.notation(), "c7c8q");
        assert_eq!(board.piece_at(sq("c8")), Some((PieceKind::Queen, Color::White)));

        board.undo_move();
        assert_eq!(board.piece_at(sq("c7")), Some((PieceKind::Pawn, Color::White)));
        assert_eq!(board.piece_at(sq("c8")), None);
        board.assert_menaces_exact();
    }

    #[test]
    fn stale_moves_are_refused() {
        let mut board = ChessBoard::new();
        board.new_game();
        let stale = board.compose_move(sq("e2"), sq("e4"), None).unwrap();
        play(&mut board, "d2", "d4");
        assert!(matches!(board.make_move(stale),
                         Err(MoveError::StaleMove { .. })));
    }

    #[test]
    fn illegal_setups_are_marked() {
        let mut board = ChessBoard::new();

        // Missing black king.
        board.set_position_from_fen("8/8/8/8/8/8/8/4K3 w").unwrap();
        assert_eq!(board.status(), GameStatus::IllegalPosition);
        assert_eq!(board.compose_move(sq("e1"), sq("e2"), None),
                   Err(MoveError::NoGame));

        // Pawn on the back rank.
        board.set_position_from_fen("P3k3/8/8/8/8/8/8/4K3 w").unwrap();
        assert_eq!(board.status(), GameStatus::IllegalPosition);

        // The side to move could capture the enemy king.
        board.set_position_from_fen("4k3/4R3/8/8/8/8/8/4K3 w").unwrap();
        assert_eq!(board.status(), GameStatus::IllegalPosition);

        // The same position with Black to move is a normal check.
        board.set_position_from_fen("4k3/4R3/8/8/8/8/8/4K3 b").unwrap();
        assert_eq!(board.status(), GameStatus::InProgress);
    }
}
