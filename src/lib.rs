//! Lysander is a chess rules engine with a depth-bounded analysis
//! search.
//!
//! The crate has two halves:
//!
//! * The **rules engine** -- [`ChessBoard`] and the types around it.
//!   It represents a legal position, tracks which pieces attack which
//!   squares incrementally, enumerates strictly legal moves
//!   (respecting pins, checks, castling and en-passant constraints),
//!   applies and takes back moves with full state consistency, and
//!   detects every terminal condition: checkmate, stalemate,
//!   insufficient material, threefold repetition, and the fifty-move
//!   rule.
//!
//! * The **search** -- [`AnalysisTree`], [`select_move`], and
//!   [`VirtualPlayer`]. The search builds a tree of reachable
//!   positions over a private copy of the board, scores the leaves
//!   with a pluggable [`Evaluator`], propagates the scores upward
//!   with a minimax rule that prefers shorter checkmates, and picks a
//!   best move at the root, breaking ties at random. `VirtualPlayer`
//!   wraps the whole thing in a background thread with cooperative
//!   cancellation, suitable for a host that keeps playing while the
//!   engine thinks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::{Arc, Mutex};
//! use lysander::{ChessBoard, MaterialEvaluator, VirtualPlayer};
//!
//! let board = Arc::new(Mutex::new(ChessBoard::new()));
//! board.lock().unwrap().new_game();
//!
//! let player = VirtualPlayer::new(Arc::clone(&board), 4, MaterialEvaluator::new());
//! player.start_thinking();
//! let chosen = player.recv_report().unwrap();
//! board.lock().unwrap().make_move(chosen).unwrap();
//! ```

pub mod board;
pub mod depth;
pub mod errors;
pub mod moves;
pub mod pieces;
pub mod player;
pub mod position;
pub mod search;
pub mod squares;
pub mod stock;
pub mod tree;
pub mod value;

pub use crate::board::{BoardObserver, ChessBoard, DrawReason, GameStatus};
pub use crate::depth::{Depth, DEPTH_MAX};
pub use crate::errors::{MoveError, NotationError, SearchError};
pub use crate::moves::{CastlingSide, Move};
pub use crate::pieces::{Color, Piece, PieceId, PieceKind, PieceValueTable,
                        STANDARD_PIECE_VALUES};
pub use crate::player::{ThinkReport, VirtualPlayer};
pub use crate::position::GamePosition;
pub use crate::search::{select_move, Evaluator};
pub use crate::squares::{File, Rank, SquareLocation};
pub use crate::stock::MaterialEvaluator;
pub use crate::tree::{AnalysisTree, MoveStub, NodeId, TreeNode};
pub use crate::value::{Value, VALUE_EVAL_MAX, VALUE_EVAL_MIN, VALUE_MAX, VALUE_MIN,
                       VALUE_UNKNOWN};
