#![warn(missing_docs)]
//! # This projects library
//!
//! This library runs one car of a fleet of elevators that share hall calls without any master.
//! Every car keeps a replicated view of the fleet, agrees with its peers on which hall calls
//! exist, and picks the car that serves each call with the same cost function on every node.
//!
//! ## Overview
//! - **Config**: Handles configuration settings.
//! - **Init**: Command line arguments and the identity of the node.
//! - **Elevio**: Interface for elevator I/O.
//! - **Elevator Logic**: The state machine of the local car and its timers.
//! - **Backup**: Crash recovery of the local queue.
//! - **Manager**: Distribution of synchronized hall calls.
//! - **Network**: Peer liveness, snapshot broadcast and replication of the world view.
//! - **World View**: The replicated fleet state and the order status reconciliation.

/// Global variables
pub mod config;

/// Help functions
pub mod ip_help_functions;

/// Initialize functions
pub mod init;

/// Print functions with color coding
pub mod print;

/// Interface for elevator input/output. Only changes are documented here. For source code see: [https://github.com/TTK4145/driver-rust/tree/master/src/elevio]
pub mod elevio;

/// Elevator control logic of the local car.
pub mod elevator_logic;

/// Persists the local queue between runs.
pub mod backup;

/// Order distribution.
pub mod manager;

/// Network communication via UDP, and replication on top of it.
pub mod network;

/// Management of the system's world view.
pub mod world_view;
