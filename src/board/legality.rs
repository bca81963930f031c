//! Implements legal-move reasoning: check detection, pins, castling
//! preconditions, per-piece destination filtering, and the
//! composition of fully described `Move` instances.
//!
//! The general strategy is analytic rather than try-and-see: a
//! candidate destination survives if it passes the geometric filter,
//! the pin filter, and the check-evasion filter. The single
//! exception is the en-passant capture, which can uncover an attack
//! on the capturer's king along the rank both pawns leave -- that one
//! case is verified by playing the capture out on the grid and
//! looking.

use crate::errors::MoveError;
use crate::moves::{CastlingSide, Move};
use crate::pieces::{direction_between, Color, PieceId, PieceKind};
use crate::squares::SquareLocation;

use super::{ChessBoard, GameStatus};


impl ChessBoard {
    /// Returns the enemy pieces currently checking the side to move's
    /// king.
    pub(super) fn checkers(&mut self) -> Vec<PieceId> {
        let color = self.to_move;
        let king_square = self.king_square(color);
        self.grid.attackers(&self.pieces, king_square, color.opponent())
    }

    /// Returns whether the side to move is in check.
    pub fn in_check(&mut self) -> bool {
        !self.checkers().is_empty()
    }

    pub(super) fn king_square(&self, color: Color) -> SquareLocation {
        let king = self.kings[color.index()].expect("a game must have kings");
        self.pieces[king.index()].square.expect("kings are never captured")
    }

    /// The squares the piece on `from` may legally move to. Empty
    /// when no game is in progress or the square does not hold a
    /// piece of the side to move.
    pub fn accessible_squares(&mut self, from: SquareLocation) -> Vec<SquareLocation> {
        if self.status != GameStatus::InProgress {
            return Vec::new();
        }
        match self.grid.occupant(from) {
            Some(id) if self.pieces[id.index()].color == self.to_move => {
                self.legal_destinations(id)
            }
            _ => Vec::new(),
        }
    }

    /// Enumerates every legal move for the side to move.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        let mut result = Vec::new();
        if self.status != GameStatus::InProgress {
            return result;
        }
        for id in self.pieces_of(self.to_move) {
            let piece = self.pieces[id.index()];
            for to in self.legal_destinations(id) {
                if piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank() {
                    for kind in [PieceKind::Queen,
                                 PieceKind::Rook,
                                 PieceKind::Bishop,
                                 PieceKind::Knight] {
                        result.push(self.build_move(id, to, Some(kind)));
                    }
                } else {
                    result.push(self.build_move(id, to, None));
                }
            }
        }
        result
    }

    /// Returns whether the side to move has at least one legal move.
    /// Cheaper than `legal_moves` since it stops at the first hit.
    pub(super) fn has_any_legal_move(&mut self) -> bool {
        for id in self.pieces_of(self.to_move) {
            if !self.legal_destinations(id).is_empty() {
                return true;
            }
        }
        false
    }

    /// Builds a fully described move from coordinates, verifying its
    /// legality.
    ///
    /// The returned move carries the board's current version stamp,
    /// so it stays applicable exactly until the next mutation. The
    /// failure is as specific as the rules allow (see `MoveError`);
    /// in particular a pawn reaching the last rank without a chosen
    /// promotion kind fails with `PromotionNotChosen`, inviting the
    /// caller to choose one and re-invoke.
    pub fn compose_move(&mut self,
                        from: SquareLocation,
                        to: SquareLocation,
                        promotion: Option<PieceKind>)
                        -> Result<Move, MoveError> {
        if self.status != GameStatus::InProgress {
            return Err(MoveError::NoGame);
        }
        let id = self.grid.occupant(from).ok_or(MoveError::Illegal)?;
        let piece = self.pieces[id.index()];
        if piece.color != self.to_move {
            return Err(MoveError::Illegal);
        }
        if !self.legal_destinations(id).contains(&to) {
            return Err(self.explain_rejection(id, to));
        }
        let promotion = if piece.kind == PieceKind::Pawn &&
                           to.rank() == piece.color.promotion_rank() {
            match promotion {
                Some(kind) if kind != PieceKind::King && kind != PieceKind::Pawn => Some(kind),
                Some(_) => return Err(MoveError::Illegal),
                None => return Err(MoveError::PromotionNotChosen),
            }
        } else {
            None
        };
        Ok(self.build_move(id, to, promotion))
    }

    /// Assembles the `Move` record for a destination that has already
    /// passed the legality filters.
    fn build_move(&self, id: PieceId, to: SquareLocation, promotion: Option<PieceKind>) -> Move {
        let piece = self.pieces[id.index()];
        let from = piece.square.expect("the mover is on the board");
        let castling = if piece.kind == PieceKind::King &&
                          (to.file() as i8 - from.file() as i8).abs() == 2 {
            Some(if to.file() == CastlingSide::Kingside.king_destination_file() {
                CastlingSide::Kingside
            } else {
                CastlingSide::Queenside
            })
        } else {
            None
        };
        let en_passant = piece.kind == PieceKind::Pawn && self.en_passant == Some(to) &&
                         self.grid.occupant(to).is_none();
        let captured = if en_passant {
            let victim_square = SquareLocation::new(to.file(), from.rank()).unwrap();
            let victim = self.grid
                .occupant(victim_square)
                .expect("an en-passant victim stands beside the capturer");
            Some((victim, PieceKind::Pawn))
        } else {
            self.grid
                .occupant(to)
                .map(|victim| (victim, self.pieces[victim.index()].kind))
        };
        Move {
            piece: id,
            kind: piece.kind,
            color: piece.color,
            from,
            to,
            captured,
            promotion,
            en_passant,
            castling,
            first_move: !piece.has_moved(),
            version: self.version,
        }
    }

    /// Names the most specific rule the rejected destination
    /// violates.
    fn explain_rejection(&mut self, id: PieceId, to: SquareLocation) -> MoveError {
        let piece = self.pieces[id.index()];
        let from = piece.square.expect("the mover is on the board");

        // A two-file king move can only be a castling attempt.
        if piece.kind == PieceKind::King && to.rank() == piece.color.back_rank() &&
           (to.file() as i8 - from.file() as i8).abs() == 2 {
            let side = if to.file() > from.file() {
                CastlingSide::Kingside
            } else {
                CastlingSide::Queenside
            };
            return match self.castling_state(side) {
                Err(e) => e,
                Ok(()) => MoveError::Illegal,
            };
        }
        if !self.pseudo_destinations(id).contains(&to) {
            return MoveError::Illegal;
        }
        if let Some(line) = self.pin_line(id) {
            if !line.contains(&to) {
                return MoveError::PinnedPiece;
            }
        }
        // What remains is a king-safety failure: moving into an
        // attack, ignoring a check, or uncovering one.
        MoveError::ExposedKing
    }

    /// The squares the given piece may legally move to.
    fn legal_destinations(&mut self, id: PieceId) -> Vec<SquareLocation> {
        let piece = self.pieces[id.index()];
        let from = piece.square.expect("the mover is on the board");

        if piece.kind == PieceKind::King {
            let opponent = piece.color.opponent();
            let mut dests: Vec<SquareLocation> = self.pseudo_destinations(id)
                .into_iter()
                .filter(|to| {
                    // The king must not shadow the ray it flees from.
                    !self.grid.is_attacked_without(&self.pieces, *to, opponent, from)
                })
                .collect();
            if self.checkers().is_empty() {
                for side in [CastlingSide::Queenside, CastlingSide::Kingside] {
                    if self.castling_state(side).is_ok() {
                        let file = side.king_destination_file();
                        dests.push(SquareLocation::new(file, piece.color.back_rank()).unwrap());
                    }
                }
            }
            return dests;
        }

        let mut dests = self.pseudo_destinations(id);
        if let Some(line) = self.pin_line(id) {
            dests.retain(|d| line.contains(d));
        }
        let checkers = self.checkers();
        match checkers.len() {
            0 => {}
            1 => {
                let checker = self.pieces[checkers[0].index()];
                let checker_square = checker.square.expect("a checker is on the board");
                let king_square = self.king_square(piece.color);

                // The check is resolved by capturing the checker or
                // by interposing on its line of attack.
                let mut allowed = vec![checker_square];
                if checker.kind.is_long_ranged() {
                    if let Some((df, dr)) = direction_between(king_square, checker_square) {
                        let mut walk = king_square;
                        while let Some(next) = walk.offset(df, dr) {
                            if next == checker_square {
                                break;
                            }
                            allowed.push(next);
                            walk = next;
                        }
                    }
                }
                // A checking just-double-pushed pawn can also be
                // taken en passant.
                if piece.kind == PieceKind::Pawn {
                    if let Some(ep) = self.en_passant {
                        if checker_square.file() == ep.file() &&
                           checker_square.rank() == from.rank() {
                            allowed.push(ep);
                        }
                    }
                }
                dests.retain(|d| allowed.contains(d));
            }
            _ => return Vec::new(),
        }

        // En passant may uncover a rank attack that no pin detects,
        // because two pawns leave the line at once. Play it out.
        if piece.kind == PieceKind::Pawn {
            if let Some(ep) = self.en_passant {
                if dests.contains(&ep) && self.grid.occupant(ep).is_none() &&
                   !self.en_passant_is_safe(from, ep) {
                    dests.retain(|d| *d != ep);
                }
            }
        }
        dests
    }

    /// The piece's destinations by geometry and occupancy alone,
    /// before any king-safety filtering.
    fn pseudo_destinations(&self, id: PieceId) -> Vec<SquareLocation> {
        let piece = self.pieces[id.index()];
        let from = piece.square.expect("the mover is on the board");
        if piece.kind != PieceKind::Pawn {
            return self.grid
                .attack_squares(&self.pieces, id)
                .into_iter()
                .filter(|to| match self.grid.occupant(*to) {
                    Some(occupant) => self.pieces[occupant.index()].color != piece.color,
                    None => true,
                })
                .collect();
        }

        // Pawns are the one kind whose moves and attacks differ.
        let mut dests = Vec::new();
        let direction = piece.color.pawn_direction();
        for df in [-1, 1] {
            if let Some(to) = from.offset(df, direction) {
                let captures = match self.grid.occupant(to) {
                    Some(victim) => self.pieces[victim.index()].color != piece.color,
                    None => self.en_passant == Some(to),
                };
                if captures {
                    dests.push(to);
                }
            }
        }
        if let Some(one) = from.offset(0, direction) {
            if self.grid.occupant(one).is_none() {
                dests.push(one);
                if from.rank() == piece.color.pawn_start_rank() {
                    if let Some(two) = one.offset(0, direction) {
                        if self.grid.occupant(two).is_none() {
                            dests.push(two);
                        }
                    }
                }
            }
        }
        dests
    }

    /// If the piece is pinned against its own king, returns the pin
    /// line: every square the piece may still occupy, from next to
    /// the king up to and including the pinning slider.
    fn pin_line(&self, id: PieceId) -> Option<Vec<SquareLocation>> {
        let piece = self.pieces[id.index()];
        let piece_square = piece.square?;
        let king_square = self.king_square(piece.color);
        let (df, dr) = direction_between(king_square, piece_square)?;

        let mut passed_piece = false;
        let mut line = Vec::new();
        let mut walk = king_square;
        while let Some(next) = walk.offset(df, dr) {
            if next == piece_square {
                passed_piece = true;
            } else {
                line.push(next);
                if let Some(occupant) = self.grid.occupant(next) {
                    let other = self.pieces[occupant.index()];
                    return if passed_piece && other.color != piece.color &&
                              other.kind.attacks_along((df, dr)) {
                        Some(line)
                    } else {
                        None
                    };
                }
            }
            walk = next;
        }
        None
    }

    /// Checks every castling precondition except "not currently in
    /// check", which the caller tests first.
    fn castling_state(&mut self, side: CastlingSide) -> Result<(), MoveError> {
        let color = self.to_move;
        let back_rank = color.back_rank();
        let king = self.kings[color.index()].expect("a game must have kings");
        let king_piece = self.pieces[king.index()];
        // Arbitrary setups can put a never-moved king anywhere, so
        // the home square is checked, not assumed.
        if king_piece.has_moved() || king_piece.square != SquareLocation::new(4, back_rank) {
            return Err(MoveError::CastlingForfeited);
        }

        let rook_square = SquareLocation::new(side.rook_file(), back_rank).unwrap();
        let rook_ok = match self.grid.occupant(rook_square) {
            Some(id) => {
                let rook = self.pieces[id.index()];
                rook.kind == PieceKind::Rook && rook.color == color && !rook.has_moved()
            }
            None => false,
        };
        if !rook_ok {
            return Err(MoveError::CastlingForfeited);
        }
        for &file in side.vacant_files() {
            let square = SquareLocation::new(file, back_rank).unwrap();
            if self.grid.occupant(square).is_some() {
                return Err(MoveError::Illegal);
            }
        }
        if !self.checkers().is_empty() {
            return Err(MoveError::CastlingPathAttacked);
        }
        for &file in side.safe_files() {
            let square = SquareLocation::new(file, back_rank).unwrap();
            if self.grid.is_attacked(&self.pieces, square, color.opponent()) {
                return Err(MoveError::CastlingPathAttacked);
            }
        }
        Ok(())
    }

    /// Plays an en-passant capture out on the grid and reports
    /// whether it leaves the capturer's king unattacked. The grid is
    /// restored before returning; the board version does not change.
    fn en_passant_is_safe(&mut self, from: SquareLocation, to: SquareLocation) -> bool {
        let victim_square = SquareLocation::new(to.file(), from.rank()).unwrap();
        let mover = self.grid.lift_piece(&mut self.pieces, from);
        let victim = self.grid.lift_piece(&mut self.pieces, victim_square);
        self.grid.drop_piece(&mut self.pieces, mover, to);
        self.grid.finish_mutation();

        let color = self.pieces[mover.index()].color;
        let king_square = self.king_square(color);
        let safe = !self.grid.is_attacked(&self.pieces, king_square, color.opponent());

        self.grid.lift_piece(&mut self.pieces, to);
        self.grid.drop_piece(&mut self.pieces, mover, from);
        self.grid.drop_piece(&mut self.pieces, victim, victim_square);
        self.grid.finish_mutation();
        safe
    }

    /// The on-board pieces of one color.
    fn pieces_of(&self, color: Color) -> Vec<PieceId> {
        self.pieces
            .iter()
            .filter(|p| p.color == color && p.is_on_board())
            .map(|p| p.id)
            .collect()
    }
}
