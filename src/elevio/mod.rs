//! ## Elevator I/O module for the local elevator
//!
//! The driver for the elevator server lives in [`elev`], the polling threads in [`poll`].
//! This module adds the narrow event/command vocabulary the rest of the program uses to talk
//! to the hardware, and [start_hardware] which wires the two together.
//!
//! ## Overview
//! - `CallType`: Enum for representing call button types.
//! - `CallButton`: A (call type, floor) pair. Used both for button presses and as a matrix index.
//! - `MotorDirection`: What the motor can be told to do.
//! - `HardwareEvent` / `HardwareCommand`: Everything that flows from and to the hardware.

pub mod elev;
pub mod poll;

use crate::config;
use crate::print;

use anyhow::{bail, Context};
use crossbeam_channel as cbc;
use serde::{Serialize, Deserialize};
use std::thread;
use tokio::sync::mpsc;


/// Represents the type of call for an elevator.
///
/// The discriminant is the row index in every [crate::world_view::ButtonMatrix],
/// and the button code used by the elevator server.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallType {
    /// Hall call to go up.
    HallUp = 0,

    /// Hall call to go down.
    HallDown = 1,

    /// Call from inside the elevator.
    Cab = 2,
}

impl CallType {
    /// All call types, in matrix row order.
    pub const ALL: [CallType; config::NUM_BUTTON_TYPES] = [CallType::HallUp, CallType::HallDown, CallType::Cab];

    /// Row index of this call type in a button matrix.
    pub fn index(self) -> usize {
        self as usize
    }

    /// `true` for calls made from a floor lobby.
    pub fn is_hall(self) -> bool {
        self != CallType::Cab
    }
}

impl TryFrom<u8> for CallType {
    type Error = anyhow::Error;

    /// Converts a button code into a `CallType`.
    ///
    /// # Examples
    /// ```
    /// # use elevfleet::elevio::CallType;
    /// assert_eq!(CallType::try_from(2).unwrap(), CallType::Cab);
    /// assert!(CallType::try_from(7).is_err());
    /// ```
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CallType::HallUp),
            1 => Ok(CallType::HallDown),
            2 => Ok(CallType::Cab),
            _ => bail!("Call type {} does not exist", value),
        }
    }
}

/// Represents a button press in an elevator system, or one cell of a button matrix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallButton {
    /// The floor where the call was made.
    pub floor: u8,

    /// The type of call.
    pub call_type: CallType,
}

impl CallButton {
    /// Creates a new call button
    pub fn new(call_type: CallType, floor: u8) -> Self {
        CallButton { floor, call_type }
    }
}

/// Motor command
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorDirection {
    Up,
    Down,
    Stop,
}

impl MotorDirection {
    /// The byte the elevator server expects for this direction
    pub fn as_driver_byte(self) -> u8 {
        match self {
            MotorDirection::Up => elev::DIRN_UP,
            MotorDirection::Down => elev::DIRN_DOWN,
            MotorDirection::Stop => elev::DIRN_STOP,
        }
    }
}

/// Events produced by the hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareEvent {
    /// A call button was pressed (rising edge).
    ButtonPressed(CallButton),
    /// The floor sensor reported a new floor.
    FloorArrived(u8),
}

/// Commands accepted by the hardware
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareCommand {
    SetMotor(MotorDirection),
    SetFloorIndicator(u8),
    SetDoorLamp(bool),
    SetButtonLamp(CallButton, bool),
    SetStopLamp(bool),
}


/// Applies a single command to the driver
pub fn apply_command(e: &elev::Elevator, cmd: HardwareCommand) -> anyhow::Result<()> {
    match cmd {
        HardwareCommand::SetMotor(dirn) => e.motor_direction(dirn.as_driver_byte()),
        HardwareCommand::SetFloorIndicator(floor) => e.floor_indicator(floor),
        HardwareCommand::SetDoorLamp(on) => e.door_light(on),
        HardwareCommand::SetButtonLamp(call, on) => e.call_button_light(call.floor, call.call_type as u8, on),
        HardwareCommand::SetStopLamp(on) => e.stop_button_light(on),
    }
}

/// Commands of step `step` of the shutdown blink.
///
/// The motor is stopped again on every step, so a command lost on the way still leaves the car
/// standing. The stop lamp is lit on even steps.
pub fn shutdown_blink(step: u32) -> [HardwareCommand; 2] {
    [HardwareCommand::SetMotor(MotorDirection::Stop), HardwareCommand::SetStopLamp(step % 2 == 0)]
}

/// Handles to a running hardware adapter
pub struct Hardware {
    /// Driver handle. Used directly only by the shutdown path.
    pub elevator: elev::Elevator,
    /// Floor the car stands at after initialization.
    pub init_floor: u8,
    /// Button presses and floor arrivals.
    pub events_rx: mpsc::UnboundedReceiver<HardwareEvent>,
    /// Motor and lamp commands.
    pub commands_tx: mpsc::UnboundedSender<HardwareCommand>,
}

/// Connects to the elevator server and starts the hardware threads.
///
/// ## Behavior
/// - Connects to `addr` and finds the starting floor, driving down if the car is between floors.
/// - Spawns the poll threads ([poll::call_buttons], [poll::floor_sensor]) on crossbeam channels.
/// - Spawns a bridge thread forwarding polled values as [HardwareEvent]s.
/// - Spawns a command thread applying every [HardwareCommand] to the driver in order.
pub fn start_hardware(addr: &str) -> anyhow::Result<Hardware> {
    let elevator = elev::Elevator::init(addr, config::NUM_FLOORS as u8)
        .with_context(|| format!("Could not connect to elevator server at {}", addr))?;
    let init_floor = find_initial_floor(&elevator)?;
    print::ok(format!("Elevator initialized at floor {}", init_floor));

    let (call_button_tx, call_button_rx) = cbc::unbounded::<CallButton>();
    let (floor_sensor_tx, floor_sensor_rx) = cbc::unbounded::<u8>();
    {
        let elevator = elevator.clone();
        thread::spawn(move || poll::call_buttons(elevator, call_button_tx, config::ELEV_POLL));
    }
    {
        let elevator = elevator.clone();
        thread::spawn(move || poll::floor_sensor(elevator, floor_sensor_tx, config::ELEV_POLL));
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel::<HardwareEvent>();
    thread::spawn(move || forward_events(call_button_rx, floor_sensor_rx, events_tx));

    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel::<HardwareCommand>();
    {
        let elevator = elevator.clone();
        thread::spawn(move || {
            while let Some(cmd) = commands_rx.blocking_recv() {
                if let Err(e) = apply_command(&elevator, cmd) {
                    print::err(format!("Hardware command {:?} failed: {:#}", cmd, e));
                }
            }
        });
    }

    Ok(Hardware { elevator, init_floor, events_rx, commands_tx })
}

/// Drives the car down until the floor sensor reports a floor, then stops.
fn find_initial_floor(e: &elev::Elevator) -> anyhow::Result<u8> {
    if let Some(floor) = e.floor_sensor()? {
        return Ok(floor);
    }
    print::info("Between floors, moving down to find a floor".to_string());
    e.motor_direction(elev::DIRN_DOWN)?;
    let floor = loop {
        if let Some(floor) = e.floor_sensor()? {
            break floor;
        }
        thread::sleep(config::ELEV_POLL);
    };
    e.motor_direction(elev::DIRN_STOP)?;
    e.floor_indicator(floor)?;
    Ok(floor)
}

/// Bridges the blocking poll threads into the async part of the program
fn forward_events(
    call_button_rx: cbc::Receiver<CallButton>,
    floor_sensor_rx: cbc::Receiver<u8>,
    events_tx: mpsc::UnboundedSender<HardwareEvent>,
) {
    loop {
        let event = cbc::select! {
            recv(call_button_rx) -> msg => match msg {
                Ok(call) => HardwareEvent::ButtonPressed(call),
                Err(_) => return,
            },
            recv(floor_sensor_rx) -> msg => match msg {
                Ok(floor) => HardwareEvent::FloorArrived(floor),
                Err(_) => return,
            },
        };
        if events_tx.send(event).is_err() {
            return;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_type_index_matches_button_code() {
        for (i, call_type) in CallType::ALL.iter().enumerate() {
            assert_eq!(call_type.index(), i);
            assert_eq!(CallType::try_from(i as u8).unwrap(), *call_type);
        }
    }

    #[test]
    fn only_cab_is_not_hall() {
        assert!(CallType::HallUp.is_hall());
        assert!(CallType::HallDown.is_hall());
        assert!(!CallType::Cab.is_hall());
    }

    #[test]
    fn motor_bytes_follow_server_protocol() {
        assert_eq!(MotorDirection::Up.as_driver_byte(), 1);
        assert_eq!(MotorDirection::Down.as_driver_byte(), u8::MAX);
        assert_eq!(MotorDirection::Stop.as_driver_byte(), 0);
    }

    #[test]
    fn shutdown_blink_stops_motor_on_every_step() {
        for step in 0..config::SHUTDOWN_BLINKS {
            let [motor, lamp] = shutdown_blink(step);
            assert_eq!(motor, HardwareCommand::SetMotor(MotorDirection::Stop));
            assert_eq!(lamp, HardwareCommand::SetStopLamp(step % 2 == 0));
        }
        assert_eq!(shutdown_blink(0)[1], HardwareCommand::SetStopLamp(true));
        assert_eq!(shutdown_blink(1)[1], HardwareCommand::SetStopLamp(false));
    }
}
