//! Domain types and pure logic for the casting identity reconciliation service.
//!
//! Nothing in this crate touches the database; the `casting-db` and
//! `casting-reconcile` crates build on these types.

pub mod conversion;
pub mod error;
pub mod lifecycle;
pub mod matching;
pub mod types;
