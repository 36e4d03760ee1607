//! # Floating point numbers
//!
//! Correctness guarantees are hard to give due to (accumulating) rounding errors, so comparisons
//! are made with tolerances and values are snapped to nearby integers or fractions where that is
//! safe.
pub mod numerical_precision;
