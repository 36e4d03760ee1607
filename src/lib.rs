//! # Core of a mixed integer solver
//!
//! The LP relaxation of a branch and bound search is managed by [`lp::Lp`]: columns and rows are
//! kept in a double linked matrix, changes are buffered and flushed to an external LP solver in
//! batches, and solves are retried with different settings when the solver reports numerical
//! trouble. Nonlinear constraint functions are represented by the expression trees in
//! [`expression`].
//!
//! The LP solver is abstracted by [`lpi::LpSolverInterface`]. A small reference implementation,
//! the dense simplex method in [`algorithm::simplex`], is included.
#![warn(missing_docs)]

pub mod algorithm;
pub mod data;
pub mod error;
pub mod expression;
pub mod lp;
pub mod lpi;
pub mod settings;

#[cfg(test)]
mod tests;
