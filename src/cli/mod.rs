//! Command implementations for the CLI binary.

pub mod import;
pub mod reconcile;
pub mod schedule;
pub mod setup;
pub mod sync;
pub mod transactions;
pub mod ui;
