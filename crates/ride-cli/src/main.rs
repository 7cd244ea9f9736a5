//! # ride CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ride_cli::commands::{
    run_actions, run_list, run_request, run_show, run_transition, ListArgs, OutputArgs,
    RequestArgs, RideRef,
};
use ride_cli::connection::ConnectionArgs;
use ride_state::RideOperation;

/// Ride lifecycle CLI.
///
/// Requests rides, moves them through their lifecycle and inspects their
/// state against a running ride API.
#[derive(Parser, Debug)]
#[command(name = "ride", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Request a ride from a pickup point to a destination.
    Request(RequestArgs),
    /// Accept a requested ride (REQUESTED → ACCEPTED).
    Accept(RideRef),
    /// Cancel a ride before pickup (REQUESTED/ACCEPTED → CANCELLED).
    Cancel(RideRef),
    /// Record that the rider was collected (ACCEPTED → PICKED_UP).
    Pickup(RideRef),
    /// Start the journey (PICKED_UP → IN_TRANSIT).
    Transit(RideRef),
    /// Finish the ride (IN_TRANSIT → COMPLETED).
    Complete(RideRef),
    /// Show the full ride record.
    Show(RideRef),
    /// List rides visible to the caller.
    List(ListArgs),
    /// Show the lifecycle stepper and available actions.
    Actions(RideRef),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let conn = &cli.connection;
    let out = &cli.output;
    let result = match &cli.command {
        Commands::Request(args) => run_request(args, conn, out).await,
        Commands::Accept(args) => run_transition(RideOperation::Accept, args, conn, out).await,
        Commands::Cancel(args) => run_transition(RideOperation::Cancel, args, conn, out).await,
        Commands::Pickup(args) => run_transition(RideOperation::Pickup, args, conn, out).await,
        Commands::Transit(args) => run_transition(RideOperation::Transit, args, conn, out).await,
        Commands::Complete(args) => run_transition(RideOperation::Complete, args, conn, out).await,
        Commands::Show(args) => run_show(args, conn, out).await,
        Commands::List(args) => run_list(args, conn, out).await,
        Commands::Actions(args) => run_actions(args, conn, out).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
