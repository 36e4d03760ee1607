//! # Fixtures for tests that require a look inside the crate.
//!
//! Convention for function names:
//!
//! * `fn column_data()`, `fn row_data()` for building blocks
//! * `fn <problem name>()` for complete LPs, returning the LP together with its handles
pub mod problems;
pub mod scripted;
