//! # config.rs – Centralized Parameter Store
//!
//! This module holds all static program parameters used throughout the system.
//! Keeping configuration in one place makes tuning, experimentation, and testing easier.

use std::sync::Mutex;
use std::time::Duration;
use once_cell::sync::Lazy;

//
// ──────────────────────────────────────────────────────────────
//   1. FLEET & ELEVATOR PARAMETERS
// ──────────────────────────────────────────────────────────────
//

/// Number of floors served by every car
pub const NUM_FLOORS: usize = 4;

/// Number of button types (hall up, hall down, cab)
pub const NUM_BUTTON_TYPES: usize = 3;

/// Upper bound on the fleet size. The world view has exactly this many slots.
pub const MAX_NUM_ELEVATORS: usize = 4;

/// Duration between elevator hardware polls
pub const ELEV_POLL: Duration = Duration::from_millis(25);

/// Default port of the elevator server / simulator
pub const DEFAULT_SIM_PORT: u16 = 15657;

/// Host running the elevator server
pub const SIM_HOST: &str = "localhost";

//
// ──────────────────────────────────────────────────────────────
//   2. TIMERS
// ──────────────────────────────────────────────────────────────
//

/// How long the door stays open at a stop
pub const DOOR_TIMER_DURATION: Duration = Duration::from_secs(3);

/// Period of the order re-confirmation watchdog
pub const WATCHDOG_TIMER_DURATION: Duration = Duration::from_secs(10);

/// Time without a floor arrival before a moving car is considered `Undefined`
pub const MOTOR_LOSS_TIMER_DURATION: Duration = Duration::from_secs(4);

/// Interval between broadcasts of the local car state
pub const BROADCAST_PERIOD: Duration = Duration::from_millis(100);

/// Number of stop lamp blinks on user interrupt
pub const SHUTDOWN_BLINKS: u32 = 10;

/// Interval between stop lamp toggles on user interrupt
pub const SHUTDOWN_BLINK_PERIOD: Duration = Duration::from_millis(200);

//
// ──────────────────────────────────────────────────────────────
//   3. NETWORK SETTINGS
// ──────────────────────────────────────────────────────────────
//

/// Port carrying car state snapshots
pub const BCAST_PORT: u16 = 20017;

/// Port carrying peer heartbeats
pub const PEERS_PORT: u16 = 20018;

/// UDP broadcast listen address (bind address)
pub static BC_LISTEN_ADDR: &str = "0.0.0.0";

/// Broadcast address used for system-wide messages
pub static BC_ADDR: &str = "255.255.255.255";

/// Interval between peer heartbeats
pub const PEER_INTERVAL: Duration = Duration::from_millis(15);

/// A peer silent for this long is reported lost
pub const PEER_TIMEOUT: Duration = Duration::from_millis(500);

/// Size of UDP receive buffer in bytes
pub const UDP_BUFFER: usize = u16::MAX as usize;

/// Broadcast key used to filter out foreign traffic on the ports above
pub const KEY_STR: &str = "Gruppe 25";

/// Identity used when no local IP can be found
pub const DISCONNECTED_ID: &str = "peer-DISCONNECTED";

//
// ──────────────────────────────────────────────────────────────
//   4. CRASH RECOVERY
// ──────────────────────────────────────────────────────────────
//

/// File holding the local queue between restarts
pub const BACKUP_FILE_PATH: &str = "order_backup.txt";

//
// ──────────────────────────────────────────────────────────────
//   5. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable printing of worldview updates
pub static PRINT_WV_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));
