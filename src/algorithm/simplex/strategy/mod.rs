//! # Simplex strategies
//!
//! Decisions inside the simplex method that don't affect correctness, only the path taken, such
//! as the choice of the entering column.
pub(crate) mod pivot_rule;
