//! Observability setup shared by the skillflow binaries.

pub mod tracing_setup;
