//! Edits of the [WorldView] made by replication.
//!
//! Every function applies one event to the world view and returns `true` if the view changed.
//! Only slot 0 is ever edited field by field. Peer slots are replaced wholesale from their own
//! snapshots, apart from `online` which is owned by the peer transport.

use crate::elevio::CallButton;
use crate::network::PeerUpdate;
use crate::print;
use crate::world_view::world_view_update::reconcile_order_status;
use crate::world_view::{cell, set_cell, CarState, ElevatorState, OrderStatus, WorldView};


/// Applies a peer join and/or peer losses.
///
/// ## Behavior
/// - A new identity marks its slot online, or claims the first unused slot.
/// - Lost identities are marked offline. Their last state is kept.
/// - A new peer with no free slot left is logged and ignored.
pub fn apply_peer_update(wv: &mut WorldView, update: &PeerUpdate) -> bool {
    let mut edited = false;

    if let Some(identity) = &update.new {
        match wv.slot_of(identity).or_else(|| wv.cars.iter().position(CarState::is_unused)) {
            Some(slot) => {
                let car = &mut wv.cars[slot];
                if car.is_unused() {
                    car.identity = identity.clone();
                }
                edited |= !car.online;
                car.online = true;
            }
            None => print::warn(format!("Fleet is full, ignoring peer {}", identity)),
        }
    }

    for identity in &update.lost {
        if let Some(slot) = wv.slot_of(identity) {
            edited |= wv.cars[slot].online;
            wv.cars[slot].online = false;
        }
    }
    edited
}

/// Replaces the slot of a peer with a snapshot it broadcast.
///
/// Echoes of my own snapshots, and snapshots of identities without a slot, are ignored.
/// The slot keeps its own `online` flag.
pub fn apply_incoming_snapshot(wv: &mut WorldView, state: CarState) -> bool {
    if state.identity == wv.mine().identity {
        return false;
    }
    let Some(slot) = wv.slot_of(&state.identity) else {
        return false;
    };
    if !wv.cars[slot].has_core_change(&state) {
        return false;
    }
    let online = wv.cars[slot].online;
    wv.cars[slot] = CarState { online, ..state };
    true
}

/// Stores the latest state of my own elevator
pub fn apply_local_elevator(wv: &mut WorldView, elevator: ElevatorState) -> bool {
    if wv.mine().elevator == elevator {
        return false;
    }
    wv.mine_mut().elevator = elevator;
    true
}

/// A hall call was pressed on this car: `None -> Requested` in my slot
pub fn request_hall_order(wv: &mut WorldView, call: CallButton) -> bool {
    if !call.call_type.is_hall() {
        return false;
    }
    advance_mine_from(wv, call, OrderStatus::None)
}

/// My elevator served `call`: `Requested -> Completing` in my slot
pub fn complete_order(wv: &mut WorldView, call: CallButton) -> bool {
    advance_mine_from(wv, call, OrderStatus::Requested)
}

fn advance_mine_from(wv: &mut WorldView, call: CallButton, from: OrderStatus) -> bool {
    let status = cell(&wv.mine().order_status, call);
    if status != from {
        return false;
    }
    set_cell(&mut wv.mine_mut().order_status, call, status.advanced());
    true
}

/// Runs one reconciliation round on my slot.
///
/// ## Returns
/// Whether my order status changed, and the calls that completed their lifecycle.
pub fn reconcile(wv: &mut WorldView) -> (bool, Vec<CallButton>) {
    let result = reconcile_order_status(wv);
    let edited = result.changed(&wv.mine().order_status);
    wv.mine_mut().order_status = result.order_status;
    (edited, result.cleared)
}
