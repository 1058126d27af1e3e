//! In-memory store implementations.
//!
//! Process-local catalog and execution store backed by `DashMap`. Used by
//! `skillflow run --ephemeral` and by tests that do not need SQLite.

pub mod execution;
pub mod skill;
