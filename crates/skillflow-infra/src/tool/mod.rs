//! Tool invoker adapters.

pub mod http;
