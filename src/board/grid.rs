//! Implements the 8x8 square lattice and the incremental menace
//! bookkeeping.
//!
//! Each square holds an optional piece and two *menace lists* -- the
//! sets of white and black pieces currently attacking the square.
//! Recomputing all attacks from scratch after every move is the
//! dominant cost of a naive engine, so the lists are maintained
//! incrementally: every placement change goes through `lift_piece`
//! and `drop_piece`, which remove the moved piece's stale attack
//! contributions, add the missing ones, and extend or truncate the
//! rays of the long-ranged pieces whose lines the change opened or
//! blocked.
//!
//! Validity is tracked lazily. Every list carries the *menace epoch*
//! at which it was last known exact; the epoch advances once per
//! placement mutation (see `finish_mutation`). A list whose stamp
//! lags the current epoch is skipped by the incremental hooks and
//! recomputed from scratch on the next query, never eagerly.

use crate::pieces::{direction_between, Color, Piece, PieceId, PieceKind, ALL_DIRECTIONS,
                    DIAGONAL_DIRECTIONS, KNIGHT_JUMPS, STRAIGHT_DIRECTIONS};
use crate::squares::SquareLocation;


/// The set of pieces of one color attacking one square.
#[derive(Clone, Debug, Default)]
struct MenaceList {
    attackers: Vec<PieceId>,
    stamp: u64,
}

impl MenaceList {
    #[inline]
    fn add(&mut self, id: PieceId) {
        if !self.attackers.contains(&id) {
            self.attackers.push(id);
        }
    }

    #[inline]
    fn remove(&mut self, id: PieceId) {
        self.attackers.retain(|a| *a != id);
    }
}


/// One square of the lattice.
#[derive(Clone, Debug, Default)]
struct SquareState {
    piece: Option<PieceId>,
    menaces: [MenaceList; 2],
}


/// The 8x8 lattice.
///
/// The grid knows nothing about turn order, move legality, or game
/// status -- it maintains exactly two invariants: no two squares ever
/// hold the same piece, and a menace list whose stamp equals the
/// current epoch reflects the true attacks on its square.
#[derive(Clone, Debug)]
pub(crate) struct SquareGrid {
    squares: [SquareState; 64],
    epoch: u64,
}

impl SquareGrid {
    pub fn new() -> SquareGrid {
        SquareGrid {
            squares: std::array::from_fn(|_| SquareState::default()),
            epoch: 1,
        }
    }

    /// Empties every square and invalidates every menace list.
    pub fn clear(&mut self) {
        for square in self.squares.iter_mut() {
            *square = SquareState::default();
        }
        self.epoch += 1;
    }

    #[inline]
    pub fn occupant(&self, location: SquareLocation) -> Option<PieceId> {
        self.squares[location.index()].piece
    }

    /// Returns the pieces of color `by` attacking `location`,
    /// recomputing the menace list first if its validity has lapsed.
    pub fn attackers(&mut self,
                     pieces: &[Piece],
                     location: SquareLocation,
                     by: Color)
                     -> Vec<PieceId> {
        self.ensure_valid(pieces, location);
        self.squares[location.index()].menaces[by.index()].attackers.clone()
    }

    /// Returns whether `location` is attacked by any piece of color
    /// `by`.
    #[inline]
    pub fn is_attacked(&mut self, pieces: &[Piece], location: SquareLocation, by: Color) -> bool {
        self.ensure_valid(pieces, location);
        !self.squares[location.index()].menaces[by.index()].attackers.is_empty()
    }

    /// Returns whether `location` would be attacked by color `by` if
    /// the square `ignored` were empty.
    ///
    /// This is a direct geometric scan that bypasses the menace
    /// lists. It answers king-safety questions of the form "may the
    /// king step here?", where the king itself must not shadow the
    /// attack ray it is fleeing from.
    pub fn is_attacked_without(&self,
                               pieces: &[Piece],
                               location: SquareLocation,
                               by: Color,
                               ignored: SquareLocation)
                               -> bool {
        !self.scan_attackers(pieces, location, by, Some(ignored)).is_empty()
    }

    /// Removes the piece standing on `location` from the board,
    /// updating every valid menace list it participates in. Returns
    /// the lifted piece.
    ///
    /// The hooks run in a fixed order: first the piece's own attack
    /// contributions are withdrawn, then the square is vacated, then
    /// the rays of the long-ranged pieces attacking the vacated
    /// square are extended through it (the "open line" update).
    pub fn lift_piece(&mut self, pieces: &mut [Piece], location: SquareLocation) -> PieceId {
        let id = self.occupant(location).expect("lift_piece from an occupied square");
        self.ensure_valid(pieces, location);

        // Withdraw the piece's own attacks.
        for target in self.attack_squares(pieces, id) {
            let color = pieces[id.index()].color.index();
            let list = &mut self.squares[target.index()].menaces[color];
            if list.stamp == self.epoch {
                list.remove(id);
            }
        }

        // Vacate the square.
        let menacers = self.valid_attackers_of(location);
        self.squares[location.index()].piece = None;
        pieces[id.index()].square = None;

        // Open the lines that the piece was blocking.
        for menacer in menacers {
            self.extend_ray(pieces, menacer, location);
        }
        id
    }

    /// Puts a piece on the empty square `location`, updating every
    /// valid menace list affected by the arrival.
    ///
    /// The hooks run in the order symmetric to `lift_piece`: first
    /// the rays of the long-ranged pieces attacking the square are
    /// truncated behind it (the "block line" update), then the square
    /// is occupied, then the piece's own attack contributions are
    /// added.
    pub fn drop_piece(&mut self, pieces: &mut [Piece], id: PieceId, location: SquareLocation) {
        debug_assert!(self.occupant(location).is_none(),
                      "drop_piece on an occupied square");
        debug_assert!(pieces[id.index()].square.is_none());
        self.ensure_valid(pieces, location);

        // Block the lines that now end on this square.
        for menacer in self.valid_attackers_of(location) {
            self.truncate_ray(pieces, menacer, location);
        }

        // Occupy the square.
        self.squares[location.index()].piece = Some(id);
        pieces[id.index()].square = Some(location);

        // Contribute the piece's own attacks.
        for target in self.attack_squares(pieces, id) {
            let color = pieces[id.index()].color.index();
            let list = &mut self.squares[target.index()].menaces[color];
            if list.stamp == self.epoch {
                list.add(id);
            }
        }
    }

    /// Closes one placement mutation (a move, an undo, a position
    /// setup step).
    ///
    /// Every list that was valid going into the mutation has been
    /// kept exact by the incremental hooks, so its stamp is promoted
    /// to the new epoch. Lists that were already stale stay stale and
    /// will be recomputed on demand.
    pub fn finish_mutation(&mut self) {
        let old = self.epoch;
        self.epoch += 1;
        for square in self.squares.iter_mut() {
            for list in square.menaces.iter_mut() {
                if list.stamp == old {
                    list.stamp = self.epoch;
                }
            }
        }
    }

    /// The squares geometrically attacked by the given piece from its
    /// current square, under the current occupancy. Occupied squares
    /// are included (an attack on a friendly piece is a defense).
    pub fn attack_squares(&self, pieces: &[Piece], id: PieceId) -> Vec<SquareLocation> {
        let piece = pieces[id.index()];
        let from = piece.square.expect("attack_squares of an off-board piece");
        let mut result = Vec::with_capacity(8);
        match piece.kind {
            PieceKind::King => {
                for &(df, dr) in ALL_DIRECTIONS.iter() {
                    if let Some(to) = from.offset(df, dr) {
                        result.push(to);
                    }
                }
            }
            PieceKind::Knight => {
                for &(df, dr) in KNIGHT_JUMPS.iter() {
                    if let Some(to) = from.offset(df, dr) {
                        result.push(to);
                    }
                }
            }
            PieceKind::Pawn => {
                let dr = piece.color.pawn_direction();
                for df in [-1, 1] {
                    if let Some(to) = from.offset(df, dr) {
                        result.push(to);
                    }
                }
            }
            _ => {
                for &(df, dr) in piece.kind.slider_directions() {
                    let mut walk = from;
                    while let Some(to) = walk.offset(df, dr) {
                        result.push(to);
                        if self.occupant(to).is_some() {
                            break;
                        }
                        walk = to;
                    }
                }
            }
        }
        result
    }

    /// Recomputes both menace lists of a square whose validity has
    /// lapsed.
    fn ensure_valid(&mut self, pieces: &[Piece], location: SquareLocation) {
        let epoch = self.epoch;
        if self.squares[location.index()].menaces[0].stamp == epoch &&
           self.squares[location.index()].menaces[1].stamp == epoch {
            return;
        }
        for color in [Color::White, Color::Black] {
            let attackers = self.scan_attackers(pieces, location, color, None);
            let list = &mut self.squares[location.index()].menaces[color.index()];
            list.attackers = attackers;
            list.stamp = epoch;
        }
    }

    /// Both colors' currently known attackers of a square. Only
    /// called on squares that `ensure_valid` has just refreshed.
    fn valid_attackers_of(&self, location: SquareLocation) -> Vec<PieceId> {
        let square = &self.squares[location.index()];
        debug_assert!(square.menaces[0].stamp == self.epoch);
        debug_assert!(square.menaces[1].stamp == self.epoch);
        let mut all = square.menaces[0].attackers.clone();
        all.extend_from_slice(&square.menaces[1].attackers);
        all
    }

    /// Adds a long-ranged piece to the menace lists beyond a square
    /// it attacks that has just been vacated. Short-ranged menacers
    /// are unaffected by the vacancy.
    fn extend_ray(&mut self, pieces: &[Piece], id: PieceId, vacated: SquareLocation) {
        let piece = pieces[id.index()];
        if !piece.kind.is_long_ranged() {
            return;
        }
        let origin = piece.square.expect("menacer must be on the board");
        let (df, dr) = direction_between(origin, vacated).expect("menacer must be aligned");
        let mut walk = vacated;
        while let Some(to) = walk.offset(df, dr) {
            let list = &mut self.squares[to.index()].menaces[piece.color.index()];
            if list.stamp == self.epoch {
                list.add(id);
            }
            if self.occupant(to).is_some() {
                break;
            }
            walk = to;
        }
    }

    /// Removes a long-ranged piece from the menace lists beyond a
    /// square it attacks that is about to be occupied.
    fn truncate_ray(&mut self, pieces: &[Piece], id: PieceId, blocked: SquareLocation) {
        let piece = pieces[id.index()];
        if !piece.kind.is_long_ranged() {
            return;
        }
        let origin = piece.square.expect("menacer must be on the board");
        let (df, dr) = direction_between(origin, blocked).expect("menacer must be aligned");
        let mut walk = blocked;
        while let Some(to) = walk.offset(df, dr) {
            let list = &mut self.squares[to.index()].menaces[piece.color.index()];
            if list.stamp == self.epoch {
                list.remove(id);
            }
            if self.occupant(to).is_some() {
                break;
            }
            walk = to;
        }
    }

    /// Computes the attackers of a square by direct geometric scan,
    /// optionally treating one square as empty.
    fn scan_attackers(&self,
                      pieces: &[Piece],
                      location: SquareLocation,
                      by: Color,
                      ignored: Option<SquareLocation>)
                      -> Vec<PieceId> {
        let mut result = Vec::new();
        let occupant_at = |loc: SquareLocation| -> Option<PieceId> {
            if Some(loc) == ignored {
                None
            } else {
                self.occupant(loc)
            }
        };

        // Knights and kings.
        for &(df, dr) in KNIGHT_JUMPS.iter() {
            if let Some(from) = location.offset(df, dr) {
                if let Some(id) = occupant_at(from) {
                    let piece = pieces[id.index()];
                    if piece.color == by && piece.kind == PieceKind::Knight {
                        result.push(id);
                    }
                }
            }
        }
        for &(df, dr) in ALL_DIRECTIONS.iter() {
            if let Some(from) = location.offset(df, dr) {
                if let Some(id) = occupant_at(from) {
                    let piece = pieces[id.index()];
                    if piece.color == by && piece.kind == PieceKind::King {
                        result.push(id);
                    }
                }
            }
        }

        // Pawns. A pawn attacks diagonally forward, so the attacker
        // stands one rank *behind* the attacked square.
        let dr = -by.pawn_direction();
        for df in [-1, 1] {
            if let Some(from) = location.offset(df, dr) {
                if let Some(id) = occupant_at(from) {
                    let piece = pieces[id.index()];
                    if piece.color == by && piece.kind == PieceKind::Pawn {
                        result.push(id);
                    }
                }
            }
        }

        // Long-ranged pieces: walk each ray to its first occupant.
        for (directions, straight) in [(&STRAIGHT_DIRECTIONS, true), (&DIAGONAL_DIRECTIONS, false)] {
            for &(df, dr) in directions.iter() {
                let mut walk = location;
                while let Some(from) = walk.offset(df, dr) {
                    if let Some(id) = occupant_at(from) {
                        let piece = pieces[id.index()];
                        let kind_matches = piece.kind == PieceKind::Queen ||
                                           piece.kind ==
                                           if straight {
                                               PieceKind::Rook
                                           } else {
                                               PieceKind::Bishop
                                           };
                        if piece.color == by && kind_matches {
                            result.push(id);
                        }
                        break;
                    }
                    walk = from;
                }
            }
        }
        result
    }

    /// Compares every menace list against a fresh geometric scan.
    /// Test support for the central grid invariant.
    #[cfg(test)]
    pub fn assert_menaces_exact(&mut self, pieces: &[Piece]) {
        for location in SquareLocation::all() {
            for color in [Color::White, Color::Black] {
                let mut lazy = self.attackers(pieces, location, color);
                let mut scanned = self.scan_attackers(pieces, location, color, None);
                lazy.sort_by_key(|id| id.index());
                scanned.sort_by_key(|id| id.index());
                assert_eq!(lazy, scanned,
                           "menace list for {} ({:?}) diverged from a fresh scan",
                           location,
                           color);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::sq;

    fn piece(id: u16, kind: PieceKind, color: Color) -> Piece {
        Piece {
            id: PieceId(id),
            kind,
            color,
            square: None,
            first_move_ply: 0,
        }
    }

    fn setup(grid: &mut SquareGrid,
             pieces: &mut Vec<Piece>,
             kind: PieceKind,
             color: Color,
             location: SquareLocation)
             -> PieceId {
        let id = PieceId(pieces.len() as u16);
        pieces.push(piece(id.0, kind, color));
        grid.drop_piece(pieces, id, location);
        grid.finish_mutation();
        id
    }

    #[test]
    fn rook_rays_open_and_block() {
        let mut grid = SquareGrid::new();
        let mut pieces = Vec::new();
        let rook = setup(&mut grid, &mut pieces, PieceKind::Rook, Color::White, sq("a1"));

        assert!(grid.is_attacked(&pieces, sq("a8"), Color::White));
        assert!(grid.is_attacked(&pieces, sq("h1"), Color::White));
        assert!(!grid.is_attacked(&pieces, sq("b2"), Color::White));

        // A blocker truncates the ray ...
        let blocker = setup(&mut grid, &mut pieces, PieceKind::Knight, Color::Black, sq("a4"));
        assert!(grid.is_attacked(&pieces, sq("a4"), Color::White));
        assert!(!grid.is_attacked(&pieces, sq("a5"), Color::White));
        assert!(!grid.is_attacked(&pieces, sq("a8"), Color::White));
        grid.assert_menaces_exact(&pieces);

        // ... and lifting the blocker opens it again.
        grid.lift_piece(&mut pieces, sq("a4"));
        grid.finish_mutation();
        assert!(grid.is_attacked(&pieces, sq("a8"), Color::White));
        grid.assert_menaces_exact(&pieces);

        // Moving the rook withdraws its old attacks.
        grid.lift_piece(&mut pieces, sq("a1"));
        grid.drop_piece(&mut pieces, rook, sq("d4"));
        grid.finish_mutation();
        assert!(!grid.is_attacked(&pieces, sq("a8"), Color::White));
        assert!(grid.is_attacked(&pieces, sq("d8"), Color::White));
        assert!(grid.is_attacked(&pieces, sq("h4"), Color::White));
        grid.assert_menaces_exact(&pieces);

        let _ = blocker;
    }

    #[test]
    fn pawn_menaces_are_diagonal_only() {
        let mut grid = SquareGrid::new();
        let mut pieces = Vec::new();
        setup(&mut grid, &mut pieces, PieceKind::Pawn, Color::White, sq("e4"));

        assert!(grid.is_attacked(&pieces, sq("d5"), Color::White));
        assert!(grid.is_attacked(&pieces, sq("f5"), Color::White));
        assert!(!grid.is_attacked(&pieces, sq("e5"), Color::White));

        setup(&mut grid, &mut pieces, PieceKind::Pawn, Color::Black, sq("d5"));
        assert!(grid.is_attacked(&pieces, sq("e4"), Color::Black));
        assert!(grid.is_attacked(&pieces, sq("c4"), Color::Black));
        grid.assert_menaces_exact(&pieces);
    }

    #[test]
    fn scan_can_ignore_a_square() {
        let mut grid = SquareGrid::new();
        let mut pieces = Vec::new();
        setup(&mut grid, &mut pieces, PieceKind::Rook, Color::Black, sq("e8"));
        setup(&mut grid, &mut pieces, PieceKind::King, Color::White, sq("e4"));

        // e3 is shadowed by the king itself, but not safe for it.
        assert!(!grid.is_attacked(&pieces, sq("e3"), Color::Black));
        assert!(grid.is_attacked_without(&pieces, sq("e3"), Color::Black, sq("e4")));
        assert!(!grid.is_attacked_without(&pieces, sq("d3"), Color::Black, sq("e4")));
    }

    #[test]
    fn stale_lists_are_recomputed_on_demand() {
        let mut grid = SquareGrid::new();
        let mut pieces = Vec::new();
        setup(&mut grid, &mut pieces, PieceKind::Queen, Color::White, sq("d1"));

        // A fresh grid starts with every list stale; a query must
        // still see the queen.
        let attackers = grid.attackers(&pieces, sq("d7"), Color::White);
        assert_eq!(attackers.len(), 1);
        grid.assert_menaces_exact(&pieces);
    }
}
