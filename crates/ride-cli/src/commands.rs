//! # Ride Subcommands
//!
//! - `request` — Request a ride (rider token).
//! - `accept`, `cancel`, `pickup`, `transit`, `complete` — Drive a ride
//!   through its lifecycle.
//! - `show` — Print the full ride record.
//! - `list` — List visible rides.
//! - `actions` — Print the stepper and the operations on offer.
//!
//! Exit codes: 0 on success, 2 when the server or the local pre-check
//! rejects a transition, 3 when the outcome could not be determined.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ride_client::{
    LifecycleSession, ListRidesParams, PerformOutcome, RideClientError, SortField, SortOrder,
};
use ride_core::{GeoPoint, RideId};
use ride_state::{RideOperation, RideStatus};
use serde::Serialize;

use crate::connection::{connect, ConnectionArgs};
use crate::render;

/// Exit code for a definitive rejection.
pub const EXIT_REJECTED: u8 = 2;
/// Exit code when a transition's outcome is unknown.
pub const EXIT_UNKNOWN: u8 = 3;

/// Output options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
}

impl OutputArgs {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }
}

/// Arguments for `ride request`.
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Pickup as `latitude,longitude`.
    #[arg(long, allow_hyphen_values = true)]
    pub from: GeoPoint,
    /// Destination as `latitude,longitude`.
    #[arg(long, allow_hyphen_values = true)]
    pub to: GeoPoint,
}

/// Arguments for commands that take a single ride.
#[derive(Args, Debug)]
pub struct RideRef {
    /// Ride identifier.
    pub id: RideId,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    CreatedAt,
    Status,
    Fare,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    Asc,
    Desc,
}

/// Arguments for `ride list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long)]
    pub page: Option<usize>,
    #[arg(long)]
    pub limit: Option<usize>,
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
    /// Only rides in this status (e.g. `REQUESTED`).
    #[arg(long)]
    pub status: Option<RideStatus>,
}

impl From<&ListArgs> for ListRidesParams {
    fn from(args: &ListArgs) -> Self {
        Self {
            page: args.page,
            limit: args.limit,
            sort: args.sort.map(|s| match s {
                SortArg::CreatedAt => SortField::CreatedAt,
                SortArg::Status => SortField::Status,
                SortArg::Fare => SortField::Fare,
            }),
            order: args.order.map(|o| match o {
                OrderArg::Asc => SortOrder::Asc,
                OrderArg::Desc => SortOrder::Desc,
            }),
            status: args.status,
        }
    }
}

/// Execute `ride request`.
pub async fn run_request(args: &RequestArgs, conn: &ConnectionArgs, out: &OutputArgs) -> Result<u8> {
    let (client, actor) = connect(conn)?;
    match LifecycleSession::request(client, actor, args.from, args.to).await {
        Ok((session, outcome)) => {
            if outcome == PerformOutcome::Reconciled {
                tracing::warn!("request timed out but the ride was created");
            }
            out.emit(session.ride(), || render::ride(session.ride()))?;
            Ok(0)
        }
        Err(err) => report_failure(err, None),
    }
}

/// Execute a transition subcommand.
pub async fn run_transition(
    operation: RideOperation,
    args: &RideRef,
    conn: &ConnectionArgs,
    out: &OutputArgs,
) -> Result<u8> {
    let (client, actor) = connect(conn)?;
    let mut session = LifecycleSession::open(client, actor, args.id)
        .await
        .with_context(|| format!("failed to load ride {}", args.id))?;

    match session.perform(operation).await {
        Ok(outcome) => {
            if outcome == PerformOutcome::Reconciled {
                tracing::warn!(%operation, "request timed out but the transition took effect");
            }
            out.emit(session.ride(), || render::ride(session.ride()))?;
            Ok(0)
        }
        Err(err) => report_failure(err, Some(&session)),
    }
}

/// Execute `ride show`.
pub async fn run_show(args: &RideRef, conn: &ConnectionArgs, out: &OutputArgs) -> Result<u8> {
    let (client, _) = connect(conn)?;
    let ride = client
        .get_ride_details(args.id)
        .await
        .with_context(|| format!("failed to load ride {}", args.id))?;
    out.emit(&ride, || render::ride(&ride))?;
    Ok(0)
}

/// Execute `ride list`.
pub async fn run_list(args: &ListArgs, conn: &ConnectionArgs, out: &OutputArgs) -> Result<u8> {
    let (client, _) = connect(conn)?;
    let page = client
        .get_all_rides(&ListRidesParams::from(args))
        .await
        .context("failed to list rides")?;
    out.emit(&page, || render::page(&page))?;
    Ok(0)
}

/// Execute `ride actions`.
pub async fn run_actions(args: &RideRef, conn: &ConnectionArgs, out: &OutputArgs) -> Result<u8> {
    let (client, _) = connect(conn)?;
    let view = client
        .ride_actions(args.id)
        .await
        .with_context(|| format!("failed to load actions for ride {}", args.id))?;
    out.emit(&view, || render::view(&view))?;
    Ok(0)
}

/// Explain a failed write, show the refreshed state, and pick an exit code.
fn report_failure(err: RideClientError, session: Option<&LifecycleSession>) -> Result<u8> {
    let code = match &err {
        RideClientError::InvalidTransition { .. }
        | RideClientError::Unauthorized { .. }
        | RideClientError::NotFound { .. }
        | RideClientError::Api { .. } => EXIT_REJECTED,
        RideClientError::Transient { .. } => EXIT_UNKNOWN,
        _ => return Err(err.into()),
    };

    eprintln!("error: {err}");
    if code == EXIT_UNKNOWN {
        eprintln!("the outcome is unknown; check the ride before retrying");
    }
    if let Some(session) = session {
        eprintln!("ride {} is {}", session.ride().id(), session.ride().status());
        eprintln!(
            "available actions: {}",
            render::operations(&session.available_operations())
        );
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_args_map_to_query() {
        let args = ListArgs {
            page: Some(2),
            limit: None,
            sort: Some(SortArg::Fare),
            order: Some(OrderArg::Asc),
            status: Some(RideStatus::Completed),
        };
        let params = ListRidesParams::from(&args);
        assert_eq!(params.page, Some(2));
        assert_eq!(params.sort, Some(SortField::Fare));
        assert_eq!(params.order, Some(SortOrder::Asc));
        assert_eq!(params.status, Some(RideStatus::Completed));
    }
}
