//! # Error reporting
//!
//! Structural errors (malformed expressions, illegal mutations) and fatal solver conditions are
//! reported through a single error type. Numerical instability is retried internally and only
//! surfaces once every retry has been exhausted. Domain anomalies in evaluation, such as a
//! division by zero, are not errors and produce IEEE special values instead.
use std::io;

use thiserror::Error;

/// Everything that can go wrong while building expressions or managing the LP relaxation.
#[derive(Error, Debug)]
pub enum Error {
    /// An operator tag is unknown or the number of children doesn't match its arity.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),
    /// The payload of an operator is inconsistent with its children.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),
    /// The call sequence is not allowed in the current state.
    ///
    /// For example, mutating a locked row or changing coefficients while diving.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// Referenced data doesn't exist or is inconsistent.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// The LP solver stayed numerically unstable with every fallback setting.
    #[error("LP {lp} could not be solved stably with any of the fallback settings")]
    UnresolvedInstability {
        /// Number of the LP that failed, used to name the dump file.
        lp: u64,
    },
    /// The LP solver reported a status that contradicts how it was called.
    #[error("inconsistent LP solver status: {0}")]
    SolverInconsistency(String),
    /// The LP solver itself failed.
    #[error("LP solver failure: {0}")]
    Solver(String),
    /// Writing a problem dump failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
