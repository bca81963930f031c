//! Implements the depth-bounded tree search and best-move selection.
//!
//! The search walks the analysis tree depth-first, replaying each
//! stub on the tree's private board on the way down and undoing it on
//! the way up. Terminal positions are scored with the fixed
//! convention (checkmate by White is `VALUE_MAX`, by Black
//! `VALUE_MIN`, any draw is `0`); positions at the depth limit are
//! scored by a pluggable `Evaluator`. Scores reach the root through
//! the tree's own propagation rule.
//!
//! A cooperative cancellation flag is checked once per visited node;
//! when it trips, the traversal unwinds, undoing every move it has
//! played, and reports `SearchError::Interrupted`.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::ChessBoard;
use crate::depth::{Depth, DEPTH_MAX};
use crate::errors::SearchError;
use crate::moves::Move;
use crate::tree::{AnalysisTree, NodeId};
use crate::value::{step_away_from_mate, Value};


/// A static position evaluator.
///
/// Takes the analysis board standing on the position to score, and
/// returns a value from White's point of view. The board is borrowed
/// mutably because scoring may probe attacks and legal moves, which
/// refresh the board's lazy bookkeeping; an evaluator must leave the
/// position itself unchanged (any move it plays out, it must undo).
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, board: &mut ChessBoard) -> Value;
}


/// Chooses a move for the side to move on the given board.
///
/// The board itself is never mutated; the search works on private
/// copies. The returned move carries the board's current version
/// stamp, so it can be applied directly as long as the board has not
/// changed in the meantime.
///
/// Two short-circuits skip the search entirely: a position with
/// exactly one legal move returns it unevaluated, and `depth <= 0`
/// returns a uniformly random legal move. Ties among equally good
/// root moves are broken uniformly at random with the injected
/// generator, so a seeded generator makes selection deterministic.
///
/// `depth` must not exceed `DEPTH_MAX`; asking for more is a
/// programming error.
pub fn select_move<E, R>(board: &ChessBoard,
                         depth: Depth,
                         evaluator: &E,
                         abort: &AtomicBool,
                         rng: &mut R)
                         -> Result<Move, SearchError>
    where E: Evaluator,
          R: Rng
{
    debug_assert!(depth <= DEPTH_MAX);
    let mut pristine = board.clone();
    let legal_moves = pristine.legal_moves();
    match legal_moves.len() {
        0 => return Err(SearchError::NoLegalMove),
        1 => return Ok(legal_moves[0]),
        _ => {}
    }
    if depth <= 0 {
        let m = legal_moves.choose(rng).copied().expect("the list is not empty");
        return Ok(m);
    }

    let mut tree = AnalysisTree::new(board);
    let root = tree.root();
    visit(&mut tree, root, depth, evaluator, abort)?;
    let root_value = tree.node(root).evaluation();
    let candidates: Vec<NodeId> = tree.children(root)
        .iter()
        .copied()
        .filter(|&child| step_away_from_mate(tree.node(child).evaluation()) == root_value)
        .collect();
    debug_assert!(!candidates.is_empty());
    let chosen = candidates.choose(rng).copied().expect("an evaluated root has a best child");
    let stub = tree.node(chosen).stub().expect("root children carry stubs");
    debug!("search done: {} nodes, value {}, playing {}{}",
           tree.node_count(),
           root_value,
           stub.from(),
           stub.to());

    // Compose the chosen move on the untouched copy, so its version
    // stamp matches the board the caller is about to apply it to.
    let m = pristine.compose_move(stub.from(), stub.to(), stub.promotion())
        .expect("the chosen move is legal on the root position");
    Ok(m)
}

/// Scores the node the tree's board is standing on, recursing into
/// its children while depth remains.
fn visit<E: Evaluator>(tree: &mut AnalysisTree,
                       node: NodeId,
                       remaining: Depth,
                       evaluator: &E,
                       abort: &AtomicBool)
                       -> Result<(), SearchError> {
    if abort.load(Ordering::Relaxed) {
        return Err(SearchError::Interrupted);
    }
    if let Some(value) = AnalysisTree::terminal_value(tree.board().status()) {
        tree.set_evaluation(node, value);
        return Ok(());
    }
    if remaining <= 0 {
        let value = evaluator.evaluate(tree.board());
        tree.set_evaluation(node, value);
        return Ok(());
    }
    for child in tree.expand(node) {
        let stub = tree.node(child).stub().expect("expanded children carry stubs");
        let board = tree.board();
        let m = board.compose_move(stub.from(), stub.to(), stub.promotion())
            .expect("expanded moves are legal on their position");
        board.make_move(m).expect("freshly composed moves are not stale");
        let outcome = visit(tree, child, remaining - 1, evaluator, abort);
        tree.board().undo_move();
        outcome?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::sq;
    use crate::stock::MaterialEvaluator;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::AtomicUsize;

    struct CountingEvaluator(AtomicUsize);

    impl Evaluator for CountingEvaluator {
        fn evaluate(&self, _board: &mut ChessBoard) -> Value {
            self.0.fetch_add(1, Ordering::Relaxed);
            0
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn a_forced_move_skips_the_search() {
        // Black's rook gives check; the only legal reply is Ra1xe1.
        let mut board = ChessBoard::new();
        board.set_position_from_fen("4k3/8/8/8/8/8/5PPP/R3r1K1 w").unwrap();

        let evaluator = CountingEvaluator(AtomicUsize::new(0));
        let abort = AtomicBool::new(false);
        let m = select_move(&board, 4, &evaluator, &abort, &mut rng()).unwrap();
        assert_eq!(m.notation(), "a1e1");
        assert_eq!(evaluator.0.load(Ordering::Relaxed), 0);

        // The returned move applies directly to the live board.
        assert!(board.make_move(m).is_ok());
    }

    #[test]
    fn depth_zero_picks_without_evaluating() {
        let mut board = ChessBoard::new();
        board.new_game();
        let evaluator = CountingEvaluator(AtomicUsize::new(0));
        let abort = AtomicBool::new(false);
        let m = select_move(&board, 0, &evaluator, &abort, &mut rng()).unwrap();
        assert_eq!(evaluator.0.load(Ordering::Relaxed), 0);
        assert!(board.make_move(m).is_ok());
    }

    #[test]
    fn a_finished_game_has_no_move_to_select() {
        let mut board = ChessBoard::new();
        board.new_game();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            board.play(sq(from), sq(to), None).unwrap();
        }
        let evaluator = CountingEvaluator(AtomicUsize::new(0));
        let abort = AtomicBool::new(false);
        assert_eq!(select_move(&board, 2, &evaluator, &abort, &mut rng()),
                   Err(SearchError::NoLegalMove));
    }

    #[test]
    fn cancellation_interrupts_the_search() {
        let mut board = ChessBoard::new();
        board.new_game();
        let evaluator = MaterialEvaluator::new();
        let abort = AtomicBool::new(true);
        assert_eq!(select_move(&board, 3, &evaluator, &abort, &mut rng()),
                   Err(SearchError::Interrupted));
        // The live board is untouched.
        assert_eq!(board.move_history().len(), 0);
        assert_eq!(board.version(), board.clone().version());
    }

    #[test]
    #[should_panic]
    fn a_depth_beyond_the_limit_is_refused() {
        let mut board = ChessBoard::new();
        board.new_game();
        let evaluator = CountingEvaluator(AtomicUsize::new(0));
        let abort = AtomicBool::new(false);
        let _ = select_move(&board, DEPTH_MAX + 1, &evaluator, &abort, &mut rng());
    }

    #[test]
    fn the_search_finds_a_mate_in_one() {
        // Back-rank mate: Black's own pawns box the king in, and the
        // white rook owns the a-file.
        let mut board = ChessBoard::new();
        board.set_position_from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w").unwrap();
        let evaluator = MaterialEvaluator::new();
        let abort = AtomicBool::new(false);
        let m = select_move(&board, 2, &evaluator, &abort, &mut rng()).unwrap();
        assert_eq!(m.notation(), "a1a8");
    }
}
