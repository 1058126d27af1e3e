//! Shared domain types for skillflow.
//!
//! This crate contains the core domain types used across the skillflow engine:
//! Skill definitions, Executions and their step results, tool invocation
//! envelopes, configuration, and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod execution;
pub mod skill;
pub mod tool;
