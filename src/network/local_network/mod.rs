//! ## Replication
//!
//! This module owns the [WorldView] of the process and is the only place it is edited. It
//! merges what the peer transport, the local elevator and distribution report, reconciles the
//! order status after every edit, and tells the rest of the program about the result.
//!
//! The module also includes an MPSC-struct, making it easier to initialize all the channels
//! carrying information into replication.
mod update_wv;

pub use update_wv::{
    apply_incoming_snapshot,
    apply_local_elevator,
    apply_peer_update,
    complete_order,
    reconcile,
    request_hall_order,
};

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};

use crate::config;
use crate::elevio::CallButton;
use crate::network::PeerUpdate;
use crate::print;
use crate::world_view::{CarState, ElevatorState, MotionState, WorldView};


/// Struct containing the sender side of every channel into replication.
#[derive(Clone)]
pub struct MpscTxs {
    /// Peer joins and losses from the transport
    pub peer_update: mpsc::UnboundedSender<PeerUpdate>,
    /// Snapshots heard from other cars
    pub incoming_snapshot: mpsc::UnboundedSender<CarState>,
    /// State of the local elevator
    pub local_elevator: mpsc::UnboundedSender<ElevatorState>,
    /// Hall calls pressed on this car
    pub hall_request: mpsc::UnboundedSender<CallButton>,
    /// Calls served by the local elevator
    pub order_completed: mpsc::UnboundedSender<CallButton>,
}

/// Struct containing the receiver side of every channel into replication.
pub struct MpscRxs {
    /// Recieves peer joins and losses
    pub peer_update: mpsc::UnboundedReceiver<PeerUpdate>,
    /// Recieves snapshots from other cars
    pub incoming_snapshot: mpsc::UnboundedReceiver<CarState>,
    /// Recieves the state of the local elevator
    pub local_elevator: mpsc::UnboundedReceiver<ElevatorState>,
    /// Recieves new hall calls
    pub hall_request: mpsc::UnboundedReceiver<CallButton>,
    /// Recieves served calls
    pub order_completed: mpsc::UnboundedReceiver<CallButton>,
}

/// Struct that combines the senders and receivers into a single entity.
pub struct Mpscs {
    /// Contains all sender channels.
    pub txs: MpscTxs,
    /// Contains all receiver channels.
    pub rxs: MpscRxs,
}

impl Mpscs {
    /// Creates a new `Mpscs` instance with initialized channels.
    pub fn new() -> Self {
        let (peer_update_tx, peer_update_rx) = mpsc::unbounded_channel();
        let (incoming_snapshot_tx, incoming_snapshot_rx) = mpsc::unbounded_channel();
        let (local_elevator_tx, local_elevator_rx) = mpsc::unbounded_channel();
        let (hall_request_tx, hall_request_rx) = mpsc::unbounded_channel();
        let (order_completed_tx, order_completed_rx) = mpsc::unbounded_channel();

        Mpscs {
            txs: MpscTxs {
                peer_update: peer_update_tx,
                incoming_snapshot: incoming_snapshot_tx,
                local_elevator: local_elevator_tx,
                hall_request: hall_request_tx,
                order_completed: order_completed_tx,
            },
            rxs: MpscRxs {
                peer_update: peer_update_rx,
                incoming_snapshot: incoming_snapshot_rx,
                local_elevator: local_elevator_rx,
                hall_request: hall_request_rx,
                order_completed: order_completed_rx,
            },
        }
    }
}

impl Default for Mpscs {
    fn default() -> Self {
        Self::new()
    }
}


/// What replication tells distribution.
///
/// Both kinds share one channel so distribution sees them in the order they happened. A call
/// can be cleared and requested again within a few events, and the clear of the old cycle must
/// never be applied after the snapshot of the new one.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationEvent {
    /// The world view changed
    Snapshot(WorldView),
    /// A call completed its lifecycle and is back at `None`
    Cleared(CallButton),
}

/// Where replication sends its results
#[derive(Debug)]
pub struct ReplicationOutputs {
    /// My car state, to the snapshot broadcaster
    pub outgoing_tx: mpsc::UnboundedSender<CarState>,
    /// Changed world views and cleared calls, to distribution
    pub distribution_tx: mpsc::UnboundedSender<ReplicationEvent>,
    /// Heartbeat enable, to the peer transmitter
    pub enable_tx: watch::Sender<bool>,
}

/// State of the replication actor
pub struct Replication {
    wv: WorldView,
    out: ReplicationOutputs,
}

impl Replication {
    /// Creates a world view where only my slot is claimed
    pub fn new(my_identity: &str, out: ReplicationOutputs) -> Self {
        let replication = Self { wv: WorldView::new(my_identity), out };
        replication.update_transmit_enable();
        replication
    }

    /// The current world view
    pub fn world_view(&self) -> &WorldView {
        &self.wv
    }

    /// A peer joined or peers were lost
    pub fn on_peer_update(&mut self, update: PeerUpdate) {
        let edited = apply_peer_update(&mut self.wv, &update);
        if let Some(new) = &update.new {
            print::ok(format!("Peer joined: {}", new));
        }
        for lost in &update.lost {
            print::warn(format!("Peer lost: {}", lost));
        }
        self.after_edit(edited);
    }

    /// A snapshot from another car
    pub fn on_incoming_snapshot(&mut self, state: CarState) {
        let edited = apply_incoming_snapshot(&mut self.wv, state);
        self.after_edit(edited);
    }

    /// A new state of my own elevator
    pub fn on_local_snapshot(&mut self, elevator: ElevatorState) {
        let edited = apply_local_elevator(&mut self.wv, elevator);
        self.update_transmit_enable();
        self.after_edit(edited);
    }

    /// A hall call pressed on this car
    pub fn on_new_hall_request(&mut self, call: CallButton) {
        let edited = request_hall_order(&mut self.wv, call);
        self.after_edit(edited);
    }

    /// A call served by my elevator
    pub fn on_order_completed(&mut self, call: CallButton) {
        let edited = complete_order(&mut self.wv, call);
        self.after_edit(edited);
    }

    /// Broadcasts my car state
    pub fn on_broadcast_tick(&self) {
        if self.out.outgoing_tx.send(self.wv.mine().clone()).is_err() {
            print::warn("Snapshot broadcaster is gone".to_string());
        }
    }

    /// Reconciles, reports cleared calls, and hands a snapshot to distribution if anything changed
    fn after_edit(&mut self, edited: bool) {
        let (reconciled, cleared) = reconcile(&mut self.wv);
        for call in cleared {
            self.to_distribution(ReplicationEvent::Cleared(call));
        }
        if edited || reconciled {
            print::worldview(&self.wv);
            self.to_distribution(ReplicationEvent::Snapshot(self.wv.clone()));
        }
    }

    fn to_distribution(&self, event: ReplicationEvent) {
        if self.out.distribution_tx.send(event).is_err() {
            print::warn("Distribution is gone".to_string());
        }
    }

    /// A car with an untrusted position stops announcing itself
    fn update_transmit_enable(&self) {
        let enable = self.wv.mine().elevator.motion != MotionState::Undefined;
        self.out.enable_tx.send_if_modified(|current| {
            let changed = *current != enable;
            *current = enable;
            changed
        });
    }
}


/// The function that runs replication.
///
/// # Note
/// This is the "heart" of the local system: every change to the world view passes through
/// here. Runs for the lifetime of the process.
pub async fn run_replication(my_identity: String, mut rxs: MpscRxs, out: ReplicationOutputs) {
    let mut replication = Replication::new(&my_identity, out);
    let mut broadcast = interval(config::BROADCAST_PERIOD);
    broadcast.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(update) = rxs.peer_update.recv() => replication.on_peer_update(update),
            Some(state) = rxs.incoming_snapshot.recv() => replication.on_incoming_snapshot(state),
            Some(elevator) = rxs.local_elevator.recv() => replication.on_local_snapshot(elevator),
            Some(call) = rxs.hall_request.recv() => replication.on_new_hall_request(call),
            Some(call) = rxs.order_completed.recv() => replication.on_order_completed(call),
            _ = broadcast.tick() => replication.on_broadcast_tick(),
        }
    }
}
