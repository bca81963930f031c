//! Implements the analysis tree -- the structure a search builds over
//! the positions reachable from a root.
//!
//! The tree owns a private copy of the game board and replays moves
//! on it as the search walks up and down; the live board is never
//! touched. Nodes are stored in a flat arena and refer to each other
//! by index, and each node carries only a compact stub of its move
//! (start, destination, promotion) rather than a full `Move`, because
//! a full move record is tied to a board version that the churning
//! analysis board invalidates on every ply anyway. A stub is turned
//! back into a verified `Move` at the moment it is played.
//!
//! Evaluations flow upward through `set_evaluation`: a node offers
//! its value (decayed one step if it lies in the mate band) to its
//! parent, which adopts it, ignores it, or -- when the offer worsens
//! the very line the parent was counting on -- recomputes itself over
//! all evaluated children.

use crate::board::{ChessBoard, GameStatus};
use crate::moves::Move;
use crate::pieces::{Color, PieceKind};
use crate::squares::SquareLocation;
use crate::value::{step_away_from_mate, Value, VALUE_UNKNOWN};


/// Identifies a node within its tree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}


/// A compact move description: just enough to replay the move on a
/// board holding the node's parent position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveStub {
    from: u8,
    to: u8,
    promotion: Option<PieceKind>,
}

impl MoveStub {
    fn of(m: &Move) -> MoveStub {
        MoveStub {
            from: m.from.index() as u8,
            to: m.to.index() as u8,
            promotion: m.promotion,
        }
    }

    #[inline]
    pub fn from(&self) -> SquareLocation {
        SquareLocation::from_index(self.from as usize)
    }

    #[inline]
    pub fn to(&self) -> SquareLocation {
        SquareLocation::from_index(self.to as usize)
    }

    #[inline]
    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }
}


/// One reachable position.
#[derive(Clone, Debug)]
pub struct TreeNode {
    parent: Option<NodeId>,

    /// The move leading from the parent to this node. `None` only at
    /// the root.
    stub: Option<MoveStub>,

    /// Plies from the root.
    depth: u8,

    /// The side that played `stub`. `None` only at the root.
    mover: Option<Color>,

    /// `VALUE_UNKNOWN` until the node is evaluated or adopts a
    /// child's value.
    evaluation: Value,

    /// The child currently responsible for this node's evaluation.
    best_child: Option<NodeId>,

    /// Created lazily on first expansion.
    children: Option<Vec<NodeId>>,
}

impl TreeNode {
    #[inline]
    pub fn evaluation(&self) -> Value {
        self.evaluation
    }

    #[inline]
    pub fn stub(&self) -> Option<MoveStub> {
        self.stub
    }

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth
    }
}


/// A tree of positions reachable from one root position.
pub struct AnalysisTree {
    nodes: Vec<TreeNode>,
    board: ChessBoard,
}

impl AnalysisTree {
    /// Creates a tree rooted at the given board's current position.
    /// The board is copied; the original is not touched again.
    pub fn new(board: &ChessBoard) -> AnalysisTree {
        AnalysisTree {
            nodes: vec![TreeNode {
                parent: None,
                stub: None,
                depth: 0,
                mover: None,
                evaluation: VALUE_UNKNOWN,
                best_child: None,
                children: None,
            }],
            board: board.clone(),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    /// The tree's private board, positioned wherever the traversal
    /// last left it.
    #[inline]
    pub fn board(&mut self) -> &mut ChessBoard {
        &mut self.board
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The children of a node, materializing them on first call from
    /// the legal moves of the node's position.
    ///
    /// The private board must be standing on the node's position.
    pub fn expand(&mut self, id: NodeId) -> Vec<NodeId> {
        if let Some(children) = &self.nodes[id.index()].children {
            return children.clone();
        }
        let mover = self.board.to_move();
        let depth = self.nodes[id.index()].depth + 1;
        let mut children = Vec::new();
        for m in self.board.legal_moves() {
            let child = NodeId(self.nodes.len() as u32);
            self.nodes.push(TreeNode {
                parent: Some(id),
                stub: Some(MoveStub::of(&m)),
                depth,
                mover: Some(mover),
                evaluation: VALUE_UNKNOWN,
                best_child: None,
                children: None,
            });
            children.push(child);
        }
        self.nodes[id.index()].children = Some(children.clone());
        children
    }

    /// The already materialized children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.index()].children {
            Some(children) => children,
            None => &[],
        }
    }

    /// Sets a node's evaluation and propagates it toward the root.
    pub fn set_evaluation(&mut self, id: NodeId, value: Value) {
        debug_assert!(value != VALUE_UNKNOWN);
        self.nodes[id.index()].evaluation = value;
        self.propagate(id);
    }

    /// Offers a node's evaluation to its ancestors, one ply at a
    /// time.
    ///
    /// At each step the offered value is the child's evaluation moved
    /// one half-move away from mate, so that the root ends up
    /// preferring the shortest win and the longest loss. The parent
    /// adopts the offer if it has no value yet or if the offer is
    /// better for the side to move at the parent; if instead the
    /// offer *worsens* the line the parent's value came from, the
    /// parent is recomputed over all its evaluated children.
    /// Propagation stops at the first ancestor whose value does not
    /// change.
    fn propagate(&mut self, start: NodeId) {
        let mut id = start;
        while let Some(parent) = self.nodes[id.index()].parent {
            let offered = step_away_from_mate(self.nodes[id.index()].evaluation);
            let maximize = self.nodes[id.index()].mover == Some(Color::White);
            let current = self.nodes[parent.index()].evaluation;

            let adopt = current == VALUE_UNKNOWN ||
                        (maximize && offered > current) ||
                        (!maximize && offered < current);
            if adopt {
                self.nodes[parent.index()].evaluation = offered;
                self.nodes[parent.index()].best_child = Some(id);
                id = parent;
                continue;
            }
            if self.nodes[parent.index()].best_child == Some(id) && offered != current {
                // The line the parent was counting on got worse;
                // settle for the best of what is known.
                let (value, best_child) = self.best_over_children(parent, maximize);
                self.nodes[parent.index()].evaluation = value;
                self.nodes[parent.index()].best_child = best_child;
                if value == current {
                    break;
                }
                id = parent;
                continue;
            }
            break;
        }
    }

    fn best_over_children(&self, parent: NodeId, maximize: bool) -> (Value, Option<NodeId>) {
        let mut best = VALUE_UNKNOWN;
        let mut best_child = None;
        for &child in self.children(parent) {
            let evaluation = self.nodes[child.index()].evaluation;
            if evaluation == VALUE_UNKNOWN {
                continue;
            }
            let offered = step_away_from_mate(evaluation);
            if best == VALUE_UNKNOWN || (maximize && offered > best) ||
               (!maximize && offered < best) {
                best = offered;
                best_child = Some(child);
            }
        }
        debug_assert!(best != VALUE_UNKNOWN,
                      "recomputing a parent that has no evaluated children");
        (best, best_child)
    }

    /// The value a terminal position contributes to the tree.
    pub fn terminal_value(status: GameStatus) -> Option<Value> {
        match status {
            GameStatus::WhiteWins => Some(crate::value::VALUE_MAX),
            GameStatus::BlackWins => Some(crate::value::VALUE_MIN),
            GameStatus::Draw(_) => Some(0),
            GameStatus::InProgress => None,
            GameStatus::NoGame | GameStatus::IllegalPosition => {
                unreachable!("the tree is always rooted at a playable position")
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{VALUE_MAX, VALUE_MIN};

    fn tree_with_standard_root() -> AnalysisTree {
        let mut board = ChessBoard::new();
        board.new_game();
        AnalysisTree::new(&board)
    }

    #[test]
    fn expansion_is_lazy_and_stable() {
        let mut tree = tree_with_standard_root();
        let root = tree.root();
        assert!(tree.children(root).is_empty());
        let children = tree.expand(root);
        assert_eq!(children.len(), 20);
        assert_eq!(tree.expand(root), children);
        assert_eq!(tree.node_count(), 21);
    }

    #[test]
    fn parent_adopts_the_best_offer_for_the_mover() {
        let mut tree = tree_with_standard_root();
        let root = tree.root();
        let children = tree.expand(root);

        // White moves from the root, so the root maximizes.
        tree.set_evaluation(children[0], -50);
        assert_eq!(tree.node(root).evaluation(), -50);
        tree.set_evaluation(children[1], 30);
        assert_eq!(tree.node(root).evaluation(), 30);
        tree.set_evaluation(children[2], -10);
        assert_eq!(tree.node(root).evaluation(), 30);
    }

    #[test]
    fn worsening_the_best_line_triggers_a_recomputation() {
        let mut tree = tree_with_standard_root();
        let root = tree.root();
        let children = tree.expand(root);

        tree.set_evaluation(children[0], 10);
        tree.set_evaluation(children[1], 40);
        assert_eq!(tree.node(root).evaluation(), 40);

        // The responsible child gets worse; the root falls back to
        // the best of the rest.
        tree.set_evaluation(children[1], -5);
        assert_eq!(tree.node(root).evaluation(), 10);
    }

    #[test]
    fn mate_values_decay_on_the_way_up() {
        let mut tree = tree_with_standard_root();
        let root = tree.root();
        let children = tree.expand(root);

        tree.set_evaluation(children[0], VALUE_MAX);
        assert_eq!(tree.node(root).evaluation(), VALUE_MAX - 1);
        tree.set_evaluation(children[1], VALUE_MIN);
        assert_eq!(tree.node(root).evaluation(), VALUE_MAX - 1);
    }
}
