//! Defines the `Value` type and its related constants.


/// Evaluation value in centipawns.
///
/// Values are always given from White's point of view. Positive
/// values mean that the position is favorable for White, negative
/// values mean that the position is favorable for Black. A value of
/// `0` means that the chances are equal (or the game is drawn). For
/// example: a value of `100` might mean that White is a pawn ahead.
///
/// # Constants:
///
/// * `VALUE_UNKNOWN` has the special meaning of "unknown value".
///
/// * Values bigger than `VALUE_EVAL_MAX` designate a win for White by
///   inevitable checkmate.
///
/// * Values smaller than `VALUE_EVAL_MIN` designate a win for Black
///   by inevitable checkmate.
///
/// * `VALUE_MAX` designates a checkmate delivered by White.
///
///    * `VALUE_MAX - 1` designates an inevitable checkmate by White
///      in 1 half-move.
///
///    * `VALUE_MAX - 2` designates an inevitable checkmate by White
///      in 2 half-moves.
///
///    * and so forth.
///
/// * `VALUE_MIN` designates a checkmate delivered by Black, with the
///   symmetric meaning for `VALUE_MIN + 1`, `VALUE_MIN + 2`, and so
///   forth.
pub type Value = i16;

pub const VALUE_UNKNOWN: Value = VALUE_MIN - 1;
pub const VALUE_MAX: Value = i16::MAX;
pub const VALUE_MIN: Value = -VALUE_MAX;
pub const VALUE_EVAL_MAX: Value = 29999;
pub const VALUE_EVAL_MIN: Value = -VALUE_EVAL_MAX;


/// Moves a value one half-move away from a checkmate.
///
/// Values inside the near-mate band are moved one step toward zero
/// for every half-move that separates them from the mating
/// position. This way shorter checkmates get better values than
/// longer ones, and the search is never indifferent between "mate in
/// 1" and "mate in 9". Values outside the band are returned
/// unchanged.
#[inline]
pub fn step_away_from_mate(value: Value) -> Value {
    debug_assert!(value != VALUE_UNKNOWN);
    if value > VALUE_EVAL_MAX {
        value - 1
    } else if value < VALUE_EVAL_MIN {
        value + 1
    } else {
        value
    }
}
