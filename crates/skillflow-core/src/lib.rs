//! Skill execution engine and port trait definitions for skillflow.
//!
//! This crate defines the "ports" (catalog store, execution store, tool
//! invoker) that the infrastructure layer implements, plus the engine that
//! drives a skill through its steps. It depends only on `skillflow-types` --
//! never on `skillflow-infra` or any database/IO crate.

pub mod repository;
pub mod skill;
pub mod tool;
