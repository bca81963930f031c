//! Implements ready-to-use parameter types for the search.
//!
//! The search itself is generic over its evaluator; this module
//! provides a reasonable default implementation.

pub mod material_evaluator;

pub use self::material_evaluator::MaterialEvaluator;
