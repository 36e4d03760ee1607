//! # Data structures
//!
//! Storage and number handling shared by the LP relaxation manager and the expression engine.
//! Algorithms introduce their specific data structures in their own modules.
pub mod arena;
pub mod interval;
pub mod linear_program;
pub mod number_types;
