//! HTTP request handlers for the REST API.

pub mod executions;
pub mod skills;
