//! ## Order distribution
//!
//! Turns button presses into orders for this car.
//!
//! Cab calls belong to this car and go straight to the state machine. Hall calls are handed to
//! replication, and only come back here once every online car has acknowledged them. A call
//! that is acknowledged fleet-wide is marked in the [DispatchTable] and given to whichever car
//! [task_allocator::should_take_order] picks. Every car runs the same decision on the same
//! snapshot, so exactly one of them injects the order.
//!
//! The watchdog of the state machine makes the decision run again for every marked call, which
//! moves orders away from cars that went offline or lost their motor.

pub mod task_allocator;

use tokio::sync::mpsc;

use crate::config;
use crate::elevator_logic::lights;
use crate::elevio::{CallButton, HardwareCommand};
use crate::network::local_network::ReplicationEvent;
use crate::print;
use crate::world_view::{all_calls, cell, set_cell, ButtonMatrix, OrderStatus, WorldView};


/// Calls this car has already run the assignment for
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTable {
    cells: ButtonMatrix<bool>,
}

impl DispatchTable {
    /// An empty table
    pub fn new() -> Self {
        Self { cells: [[false; config::NUM_FLOORS]; config::NUM_BUTTON_TYPES] }
    }

    /// `true` if `call` is marked
    pub fn is_marked(&self, call: CallButton) -> bool {
        cell(&self.cells, call)
    }

    /// Marks `call`. Returns `false` if it already was marked.
    pub fn mark(&mut self, call: CallButton) -> bool {
        let newly = !self.is_marked(call);
        set_cell(&mut self.cells, call, true);
        newly
    }

    /// Unmarks `call`
    pub fn clear(&mut self, call: CallButton) {
        set_cell(&mut self.cells, call, false);
    }

    /// Every marked call
    pub fn marked(&self) -> impl Iterator<Item = CallButton> + '_ {
        all_calls().filter(|call| self.is_marked(*call))
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` if `call` is `Requested` in my slot and in every online peer.
pub fn is_synchronized(wv: &WorldView, call: CallButton) -> bool {
    cell(&wv.mine().order_status, call) == OrderStatus::Requested
        && wv.online_peers().all(|peer| cell(&peer.order_status, call) == OrderStatus::Requested)
}


/// Where distribution sends its results
#[derive(Debug, Clone)]
pub struct DistributionOutputs {
    /// Lamp commands
    pub hw_tx: mpsc::UnboundedSender<HardwareCommand>,
    /// Orders for the local state machine
    pub new_order_tx: mpsc::UnboundedSender<CallButton>,
    /// New hall calls, to replication
    pub hall_request_tx: mpsc::UnboundedSender<CallButton>,
}

/// State of the distribution actor
pub struct Distribution {
    table: DispatchTable,
    last_snapshot: Option<WorldView>,
    out: DistributionOutputs,
}

impl Distribution {
    /// Creates a distribution with an empty dispatch table
    pub fn new(out: DistributionOutputs) -> Self {
        Self { table: DispatchTable::new(), last_snapshot: None, out }
    }

    /// The dispatch table
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// A call button was pressed on this car's panel
    pub fn on_button_pressed(&mut self, call: CallButton) {
        if call.call_type.is_hall() {
            if self.out.hall_request_tx.send(call).is_err() {
                print::warn(format!("Hall call {:?} not delivered to replication", call));
            }
        } else {
            lights::set_button_light(&self.out.hw_tx, call, true);
            self.inject(call);
        }
    }

    /// A new merged view of the fleet
    pub fn on_fleet_snapshot(&mut self, wv: WorldView) {
        for call in all_calls() {
            if is_synchronized(&wv, call) && self.table.mark(call) {
                print::info(format!("Synchronized {:?}", call));
                lights::set_button_light(&self.out.hw_tx, call, true);
                if task_allocator::should_take_order(&wv, call) {
                    self.inject(call);
                }
            }
        }
        self.last_snapshot = Some(wv);
    }

    /// `call` reached `None` again after being served
    pub fn on_order_cleared(&mut self, call: CallButton) {
        lights::set_button_light(&self.out.hw_tx, call, false);
        self.table.clear(call);
    }

    /// Applies one event from replication
    pub fn on_replication_event(&mut self, event: ReplicationEvent) {
        match event {
            ReplicationEvent::Snapshot(wv) => self.on_fleet_snapshot(wv),
            ReplicationEvent::Cleared(call) => self.on_order_cleared(call),
        }
    }

    /// Re-runs the assignment for every marked call against the last snapshot
    pub fn on_watchdog_timeout(&mut self) {
        let Some(wv) = &self.last_snapshot else {
            return;
        };
        let won: Vec<CallButton> = self
            .table
            .marked()
            .filter(|call| task_allocator::should_take_order(wv, *call))
            .collect();
        for call in won {
            self.inject(call);
        }
    }

    fn inject(&self, call: CallButton) {
        if self.out.new_order_tx.send(call).is_err() {
            print::warn(format!("Order {:?} not delivered to local elevator", call));
        }
    }
}


/// Runs distribution until every input has closed.
///
/// ## Parameters
/// - `button_rx`: Button presses from the hardware.
/// - `replication_rx`: Merged fleet views and cleared calls, in the order replication sent them.
/// - `watchdog_rx`: Watchdog expiries from the local elevator.
pub async fn run_distribution(
    mut button_rx: mpsc::UnboundedReceiver<CallButton>,
    mut replication_rx: mpsc::UnboundedReceiver<ReplicationEvent>,
    mut watchdog_rx: mpsc::UnboundedReceiver<()>,
    out: DistributionOutputs,
) {
    let mut distribution = Distribution::new(out);
    loop {
        tokio::select! {
            Some(event) = replication_rx.recv() => distribution.on_replication_event(event),
            Some(call) = button_rx.recv() => distribution.on_button_pressed(call),
            Some(()) = watchdog_rx.recv() => distribution.on_watchdog_timeout(),
            else => break,
        }
    }
    print::warn("Distribution stopped, all inputs closed".to_string());
}
