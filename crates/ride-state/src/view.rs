//! # Lifecycle View
//!
//! What a particular viewer should see for a ride: the five-step stepper
//! position, the status badge and the operations that viewer may invoke.
//! Front ends render this instead of mapping raw status strings
//! themselves.

use ride_core::{Actor, RideId};
use serde::{Deserialize, Serialize};

use crate::ride::Ride;
use crate::status::{RideOperation, RideStatus};

/// Visual treatment of the status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    Outline,
    Build,
    Secondary,
    Process,
    Success,
    Destructive,
}

impl BadgeVariant {
    /// Badge for a status.
    pub fn for_status(status: RideStatus) -> Self {
        match status {
            RideStatus::Requested => Self::Outline,
            RideStatus::Accepted => Self::Build,
            RideStatus::PickedUp => Self::Secondary,
            RideStatus::InTransit => Self::Process,
            RideStatus::Completed => Self::Success,
            RideStatus::Cancelled => Self::Destructive,
        }
    }
}

/// Where a stepper step stands relative to the ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// The step's status has been reached.
    Done,
    /// The ride is waiting on this step.
    Current,
    /// Not reached yet, still reachable.
    Upcoming,
    /// Unreachable because the ride was cancelled.
    Skipped,
}

/// One step of the stepper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleStep {
    /// 1-based position.
    pub step: u8,
    pub title: String,
    pub description: String,
    /// Status entered when this step completes.
    pub status: RideStatus,
    pub state: StepState,
}

const STEPS: [(&str, &str); 5] = [
    ("Request Ride", "A request for a ride has been made."),
    (
        "Confirm Request / Cancel Request",
        "The ride request can be confirmed or canceled.",
    ),
    ("Pick-up", "The driver is on the way to pick you up."),
    ("In-transit", "The ride is in progress."),
    ("Complete Ride", "The ride has been completed."),
];

/// A ride as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleView {
    pub ride_id: RideId,
    pub status: RideStatus,
    pub badge: BadgeVariant,
    pub steps: Vec<LifecycleStep>,
    /// The step awaiting action; `None` once terminal.
    pub current_step: Option<u8>,
    /// Operations this viewer may invoke now, forward step first.
    pub operations: Vec<RideOperation>,
    pub terminal: bool,
}

impl LifecycleView {
    /// Build the view of `ride` for `viewer`.
    pub fn for_viewer(ride: &Ride, viewer: &Actor) -> Self {
        let status = ride.status();
        let terminal = status.is_terminal();
        let awaiting = if terminal {
            None
        } else {
            status.progression_index().map(|i| i + 1)
        };

        let steps = RideStatus::PROGRESSION
            .iter()
            .zip(STEPS)
            .enumerate()
            .map(|(idx, (step_status, (title, description)))| {
                let state = if ride.has_reached(*step_status) {
                    StepState::Done
                } else if Some(idx) == awaiting {
                    StepState::Current
                } else if status == RideStatus::Cancelled {
                    StepState::Skipped
                } else {
                    StepState::Upcoming
                };
                LifecycleStep {
                    step: idx as u8 + 1,
                    title: title.to_string(),
                    description: description.to_string(),
                    status: *step_status,
                    state,
                }
            })
            .collect();

        Self {
            ride_id: ride.id(),
            status,
            badge: BadgeVariant::for_status(status),
            steps,
            current_step: awaiting.map(|i| i as u8 + 1),
            operations: ride.available_operations_for(viewer),
            terminal,
        }
    }
}
