//! # Representing linear programs
//!
//! Small vocabulary types used to describe variables, bounds and constraint sides.
pub mod elements;
