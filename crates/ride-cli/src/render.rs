//! Plain-text rendering of rides, lifecycle views and listings.

use std::fmt::Write;

use ride_client::RidePage;
use ride_core::Timestamp;
use ride_state::{LifecycleView, Ride, RideOperation, StepState};

fn when(t: Option<Timestamp>) -> String {
    t.map_or_else(|| "-".to_string(), |t| t.to_string())
}

/// Full ride record, one field per line.
pub fn ride(ride: &Ride) -> String {
    let mut out = String::new();
    let driver = ride
        .driver_id()
        .map_or_else(|| "-".to_string(), |d| d.to_string());
    let _ = writeln!(out, "ride          {}", ride.id());
    let _ = writeln!(out, "status        {}", ride.status());
    let _ = writeln!(out, "rider         {}", ride.rider_id());
    let _ = writeln!(out, "driver        {driver}");
    let _ = writeln!(out, "pickup        {}", ride.pickup_location());
    let _ = writeln!(out, "destination   {}", ride.destination());
    let _ = writeln!(out, "fare          {}", ride.fare());
    let _ = writeln!(out, "requested_at  {}", ride.requested_at());
    let _ = writeln!(out, "accepted_at   {}", when(ride.accepted_at()));
    let _ = writeln!(out, "picked_up_at  {}", when(ride.picked_up_at()));
    let _ = writeln!(out, "transit_at    {}", when(ride.transit_at()));
    let _ = writeln!(out, "completed_at  {}", when(ride.completed_at()));
    let _ = writeln!(out, "cancelled_at  {}", when(ride.cancelled_at()));
    if let Some(by) = ride.cancelled_by() {
        let _ = writeln!(out, "cancelled_by  {by}");
    }
    out
}

pub fn operations(ops: &[RideOperation]) -> String {
    if ops.is_empty() {
        return "none".to_string();
    }
    ops.iter().map(RideOperation::as_str).collect::<Vec<_>>().join(", ")
}

/// Stepper plus the operations on offer.
pub fn view(view: &LifecycleView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ride {}  [{}]", view.ride_id, view.status);
    for step in &view.steps {
        let mark = match step.state {
            StepState::Done => "[x]",
            StepState::Current => "[>]",
            StepState::Upcoming => "[ ]",
            StepState::Skipped => "[-]",
        };
        let _ = writeln!(out, "  {mark} {}. {}", step.step, step.title);
    }
    let _ = writeln!(out, "actions: {}", operations(&view.operations));
    out
}

/// One line per ride, then the page position.
pub fn page(page: &RidePage) -> String {
    let mut out = String::new();
    for r in &page.data {
        let _ = writeln!(
            out,
            "{}  {:<10}  {:>8}  {}",
            r.id(),
            r.status().as_str(),
            r.fare().to_string(),
            r.requested_at()
        );
    }
    let _ = writeln!(
        out,
        "page {}/{} ({} rides)",
        page.meta.page,
        page.meta.total_pages.max(1),
        page.meta.total_docs
    );
    out
}
