//! # Middleware
//!
//! Request metrics and HTTP tracing for the ride service.

pub mod metrics;
pub mod tracing_layer;
