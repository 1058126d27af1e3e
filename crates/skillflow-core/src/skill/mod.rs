//! Skill engine: definition loading, input validation, and execution.
//!
//! - `definition` -- YAML/JSON parsing, structural validation, file discovery
//! - `validator` -- input defaults and type/rule checks before a run starts
//! - `interpolate` -- `{{name}}` placeholder substitution in step parameters
//! - `condition` -- decides whether a step runs
//! - `transform` -- reshapes a step result before it is saved
//! - `retry` -- retry decision and delay computation
//! - `step_executor` -- runs one step against the tool invoker with retries
//! - `engine` -- the execution coordinator

pub mod condition;
pub mod definition;
pub mod engine;
pub mod interpolate;
pub mod retry;
pub mod step_executor;
pub mod transform;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;
