//! Observability setup for Tripmate binaries.

pub mod tracing_setup;
