//! Defines the `Depth` type and its related constants.


/// Search depth in half-moves.
///
/// The analysis tree materializes one node per legal move for every
/// expanded position, so the depth tells how many plies ahead of the
/// root position the tree reaches. Because the whole tree is kept in
/// memory, practical depths are small.
///
/// # Limits:
///
/// * `DEPTH_MAX` is the maximum allowed search depth in half-moves.
///
/// * A depth of `0` is allowed and means "pick a legal move without
///   looking ahead".
pub type Depth = i16;

pub const DEPTH_MAX: Depth = 32;
