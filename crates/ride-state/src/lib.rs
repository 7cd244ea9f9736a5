//! # ride-state — Ride Lifecycle State Machine
//!
//! The single authoritative definition of how a ride moves through its
//! lifecycle. Every consumer (the HTTP service, the client, the CLI)
//! calls into this crate instead of re-deriving legality from raw status
//! strings.
//!
//! ## States
//!
//! ```text
//! REQUESTED ──▶ ACCEPTED ──▶ PICKED_UP ──▶ IN_TRANSIT ──▶ COMPLETED
//!     │             │
//!     └──────┬──────┘
//!            ▼
//!        CANCELLED
//! ```
//!
//! ## Modules
//!
//! - [`status`]: the closed status set and the operation table (source
//!   states, target state, permitted roles).
//! - [`policy`]: actor checks and `can_transition` / `available_operations`.
//! - [`ride`]: the [`Ride`] record, its transitions and timestamp
//!   bookkeeping, plus invariant verification for records read from
//!   elsewhere.
//! - [`view`]: what a given viewer should see and be offered right now.
//!
//! ## Design
//!
//! The machine is an enum with validated transitions rather than a
//! typestate. Rides are loaded from storage and from the network with a
//! status only known at runtime, and every transition must produce a
//! structured error that names the current state, so runtime validation
//! is the natural fit.

pub mod error;
pub mod policy;
pub mod ride;
pub mod status;
pub mod view;

pub use error::{IntegrityError, RideError};
pub use policy::{authorize, available_operations, can_transition, check, operations_for};
pub use ride::{Ride, RideTransitionRecord};
pub use status::{RideOperation, RideStatus};
pub use view::{BadgeVariant, LifecycleStep, LifecycleView, StepState};
