//! # Number types
//!
//! The LP relaxation is computed in floating point. This module collects helpers that deal with
//! the limited precision of those numbers.
pub mod float;
