//! # ride-cli — Command-line front end for the ride lifecycle API
//!
//! ```bash
//! ride --token rider:$RIDER_ID:$SECRET request --from 40.7128,-74.0060 --to 40.7580,-73.9855
//! ride --token driver:$DRIVER_ID:$SECRET accept $RIDE_ID
//! ride actions $RIDE_ID
//! ride list --status REQUESTED --sort fare --order asc
//! ```
//!
//! Transitions go through [`ride_client::LifecycleSession`], so an
//! operation the ride cannot take is refused before any request is sent,
//! and a timed-out transition is reconciled against the server's record.

pub mod commands;
pub mod connection;
pub mod render;
