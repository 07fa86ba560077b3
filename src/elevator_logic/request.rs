//! Elevator request evaluation and heading decision logic.
//!
//! Stateless helpers used by the elevator state machine. Every function looks at a snapshot of
//! [ElevatorState] and answers one question about its local queue.
//!
//! # Overview
//! - Checking for calls above, below, or at the current floor.
//! - Choosing which heading to continue in.
//! - Determining whether to stop at the current floor.
//! - Deciding which calls at the current floor are served when the door opens.

use crate::config;
use crate::elevio::{CallButton, CallType};
use crate::world_view::{cell, ElevatorState, Heading};


fn floor_has_call(elevator: &ElevatorState, floor: usize) -> bool {
    CallType::ALL.iter().any(|call_type| elevator.local_queue[call_type.index()][floor])
}

/// Checks if there are any calls on floors higher than the current one.
pub fn above(elevator: &ElevatorState) -> bool {
    (elevator.floor as usize + 1..config::NUM_FLOORS).any(|floor| floor_has_call(elevator, floor))
}

/// Checks if there are any calls on floors lower than the current one.
pub fn below(elevator: &ElevatorState) -> bool {
    (0..elevator.floor as usize).any(|floor| floor_has_call(elevator, floor))
}

/// Checks for any call at the current floor.
pub fn here(elevator: &ElevatorState) -> bool {
    floor_has_call(elevator, elevator.floor as usize)
}

fn here_of(elevator: &ElevatorState, call_type: CallType) -> bool {
    cell(&elevator.local_queue, CallButton::new(call_type, elevator.floor))
}

/// Picks the heading to take calls in from here.
///
/// Keeps the current heading while there is a call further that way, or a hall call at this
/// floor in the same direction. Otherwise reverses. Terminal floors force the only possible
/// heading.
pub fn choose_heading(elevator: &ElevatorState) -> Heading {
    let top = (config::NUM_FLOORS - 1) as u8;
    match elevator.heading {
        Heading::Up => {
            if above(elevator) || here_of(elevator, CallType::HallUp) || elevator.floor == 0 {
                Heading::Up
            } else {
                Heading::Down
            }
        }
        Heading::Down => {
            if below(elevator) || here_of(elevator, CallType::HallDown) || elevator.floor == top {
                Heading::Down
            } else {
                Heading::Up
            }
        }
    }
}

/// Determines whether the elevator should stop at the current floor.
///
/// Stops for a cab call here, a hall call here in the heading, or when nothing is left
/// further along the heading.
pub fn should_stop(elevator: &ElevatorState) -> bool {
    if here_of(elevator, CallType::Cab) {
        return true;
    }
    match elevator.heading {
        Heading::Up => here_of(elevator, CallType::HallUp) || !above(elevator),
        Heading::Down => here_of(elevator, CallType::HallDown) || !below(elevator),
    }
}

/// Whether `call_type` at the current floor is served by opening the door here.
///
/// A hall call against the heading is only served if no call is waiting further in its own
/// direction and no hall call for the heading is at this floor.
pub fn should_clear(elevator: &ElevatorState, call_type: CallType) -> bool {
    if !here_of(elevator, call_type) {
        return false;
    }
    match (call_type, elevator.heading) {
        (CallType::Cab, _) => true,
        (CallType::HallUp, Heading::Up) | (CallType::HallDown, Heading::Down) => true,
        (CallType::HallUp, Heading::Down) => !here_of(elevator, CallType::HallDown) && !below(elevator),
        (CallType::HallDown, Heading::Up) => !here_of(elevator, CallType::HallUp) && !above(elevator),
    }
}
