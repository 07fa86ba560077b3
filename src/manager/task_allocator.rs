//! Cost based assignment of hall calls.
//!
//! Every car runs [should_take_order] on the same replicated snapshot and must reach the same
//! answer, so everything in here is a pure function of the [WorldView] and the call.
//!
//! | motion                      | cost               |
//! |-----------------------------|--------------------|
//! | `Idle`                      | `|Δfloor|`         |
//! | `DoorOpen`                  | `1 + |Δfloor|`     |
//! | `Moving`, towards the call  | `2 × |Δfloor|`     |
//! | `Moving`, away from it      | `5`                |
//! | `Undefined`                 | not a candidate    |

use crate::elevio::{CallButton, CallType};
use crate::world_view::{CarState, ElevatorState, Heading, MotionState, WorldView};


/// Cost of a car that is moving away from the call
const MOVING_AWAY_COST: u32 = 5;

/// Whether a moving car will pass `call` without turning.
///
/// A car moving past the call floor is never towards it, and a hall call against the heading
/// never is.
pub fn is_moving_towards(elevator: &ElevatorState, call: CallButton) -> bool {
    if elevator.floor == call.floor && elevator.motion == MotionState::Moving {
        return false;
    }
    match (elevator.heading, call.call_type) {
        (Heading::Up, CallType::Cab | CallType::HallUp) => elevator.floor <= call.floor,
        (Heading::Down, CallType::Cab | CallType::HallDown) => call.floor <= elevator.floor,
        _ => false,
    }
}

/// Cost of `elevator` serving `call`. `None` for a car that can not be trusted to move.
pub fn compute_cost(elevator: &ElevatorState, call: CallButton) -> Option<u32> {
    let distance = elevator.floor.abs_diff(call.floor) as u32;
    match elevator.motion {
        MotionState::Idle => Some(distance),
        MotionState::DoorOpen => Some(1 + distance),
        MotionState::Moving if is_moving_towards(elevator, call) => Some(2 * distance),
        MotionState::Moving => Some(MOVING_AWAY_COST),
        MotionState::Undefined => None,
    }
}

/// The car with the lowest cost. Equal costs go to the lexicographically greatest identity.
pub fn best_car<'a>(candidates: impl Iterator<Item = &'a CarState>, call: CallButton) -> Option<&'a CarState> {
    candidates
        .filter_map(|car| compute_cost(&car.elevator, call).map(|cost| (cost, car)))
        .min_by(|(cost_a, car_a), (cost_b, car_b)| {
            cost_a.cmp(cost_b).then_with(|| car_b.identity.cmp(&car_a.identity))
        })
        .map(|(_, car)| car)
}

/// Decides if this car should serve `call`.
///
/// A car alone on the network always takes the call. Otherwise the candidates are this car and
/// every online peer.
pub fn should_take_order(wv: &WorldView, call: CallButton) -> bool {
    if wv.is_alone() {
        return true;
    }
    let candidates = std::iter::once(wv.mine()).chain(wv.online_peers());
    best_car(candidates, call).is_some_and(|car| car.identity == wv.mine().identity)
}
