//! Start-up of a car: command line arguments, logging toggles and the identity of the node.

use clap::Parser;
use local_ip_address::local_ip;
use std::sync::Mutex;

use crate::config;
use crate::ip_help_functions::ip2identity;
use crate::print;


/// Command line arguments of a car.
///
/// ## Example
/// ```text
/// elevfleet --port 15658 --id car-2 --no-worldview
/// ```
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "elevfleet", about = "Decentralized elevator fleet controller")]
pub struct Args {
    /// Identity of this car on the network. Defaults to `peer-<local ip>`.
    #[arg(long)]
    pub id: Option<String>,

    /// Port of the elevator server on localhost
    #[arg(long, default_value_t = config::DEFAULT_SIM_PORT)]
    pub port: u16,

    /// Only print errors
    #[arg(long)]
    pub quiet: bool,

    /// Do not print the world view table
    #[arg(long)]
    pub no_worldview: bool,
}

/// Parses the arguments of the process. Exits the process on `--help` or invalid input.
pub fn parse_args() -> Args {
    Args::parse()
}

fn set(flag: &Mutex<bool>, on: bool) {
    match flag.lock() {
        Ok(mut guard) => *guard = on,
        Err(poisoned) => *poisoned.into_inner() = on,
    }
}

/// Flips the logging toggles in [config] according to `args`
pub fn apply_print_flags(args: &Args) {
    if args.quiet {
        set(&config::PRINT_WV_ON, false);
        set(&config::PRINT_WARN_ON, false);
        set(&config::PRINT_OK_ON, false);
        set(&config::PRINT_INFO_ON, false);
    }
    if args.no_worldview {
        set(&config::PRINT_WV_ON, false);
    }
}

/// Identity of this car.
///
/// ## Behavior
/// - `--id` wins if given.
/// - Otherwise the identity is built from the local IP address.
/// - Without a network the car starts as [config::DISCONNECTED_ID].
pub fn derive_identity(args: &Args) -> String {
    if let Some(id) = &args.id {
        return id.clone();
    }
    match local_ip() {
        Ok(ip) => ip2identity(ip),
        Err(e) => {
            print::warn(format!("Failed to get local IP at startup: {}", e));
            config::DISCONNECTED_ID.to_string()
        }
    }
}
