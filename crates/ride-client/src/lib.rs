//! # ride-client — Typed Rust client for the ride lifecycle API
//!
//! - [`RideClient`]: one method per endpoint, bounded by a per-request
//!   timeout. Reads retry transient failures with exponential backoff;
//!   creation and transitions are sent once.
//! - [`LifecycleSession`]: one actor's working copy of one ride, with
//!   local pre-checks and reconciliation after transient failures.
//!
//! Errors distinguish a rejected transition
//! ([`RideClientError::InvalidTransition`], carrying the ride's actual
//! status) from an unknown outcome ([`RideClientError::Transient`]).

pub mod config;
pub mod error;
pub(crate) mod retry;
pub mod rides;
pub mod session;

pub use config::{ConfigError, RideClientConfig};
pub use error::RideClientError;
pub use rides::{ListRidesParams, PageMeta, RideClient, RidePage, SortField, SortOrder};
pub use session::{applied_by, LifecycleSession, PerformOutcome};
