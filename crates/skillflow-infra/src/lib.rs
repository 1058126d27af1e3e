//! Infrastructure layer for skillflow.
//!
//! Contains implementations of the port traits defined in `skillflow-core`:
//! SQLite and in-memory stores, the HTTP tool invoker, plus config loading
//! and data directory resolution.

pub mod config;
pub mod filesystem;
pub mod memory;
pub mod sqlite;
pub mod tool;
