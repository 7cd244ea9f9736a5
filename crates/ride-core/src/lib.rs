#![deny(missing_docs)]

//! # ride-core — Foundational Types for the Ride Platform
//!
//! Every other crate in the workspace depends on the types defined here.
//! This crate has no internal dependencies — only `serde`, `thiserror`,
//! `chrono` and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`RiderId`] cannot be passed
//!    where a [`DriverId`] is expected, and neither can stand in for a
//!    [`RideId`].
//!
//! 2. **Validated value types.** [`GeoPoint`] and [`Fare`] reject invalid
//!    input at construction and during deserialization, so a ride record
//!    that made it into memory has sane coordinates and a non-negative fare.
//!
//! 3. **Explicit actors.** An [`Actor`] carries both the [`Role`] and the
//!    identity of whoever is attempting an operation. Authorization is a
//!    function of the actor, never of which screen rendered a button.

pub mod actor;
pub mod error;
pub mod fare;
pub mod geo;
pub mod identity;
pub mod temporal;

pub use actor::{Actor, Role};
pub use error::ValidationError;
pub use fare::Fare;
pub use geo::GeoPoint;
pub use identity::{AdminId, DriverId, RideId, RiderId};
pub use temporal::Timestamp;
