//! Order-status reconciliation.
//!
//! Every car gossips its own order-status matrix. Reconciliation moves each cell of my matrix
//! at most one step along `None -> Requested -> Completing -> None`, based on what the online
//! peers report:
//!
//! | mine         | advances when                                   |
//! |--------------|-------------------------------------------------|
//! | `None`       | any online peer reports `Requested`             |
//! | `Requested`  | any online peer reports `Completing`            |
//! | `Completing` | no online peer still reports `Requested`        |
//!
//! A `Completing -> None` step retires the call on this car, and is reported so the lamp and
//! dispatch bookkeeping can be released.

use crate::elevio::CallButton;
use crate::world_view::{all_calls, cell, set_cell, OrderStatus, OrderStatusMatrix, WorldView};


/// Result of one reconciliation round
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// My new order-status matrix
    pub order_status: OrderStatusMatrix,
    /// Cells that went from `Completing` to `None` this round
    pub cleared: Vec<CallButton>,
}

impl Reconciliation {
    /// `true` if the round changed anything compared to `before`
    pub fn changed(&self, before: &OrderStatusMatrix) -> bool {
        self.order_status != *before
    }
}

/// Runs one reconciliation round over every cell of my slot in `wv`.
///
/// Pure: `wv` is not touched, the caller decides what to do with the result.
pub fn reconcile_order_status(wv: &WorldView) -> Reconciliation {
    let mut order_status = wv.mine().order_status;
    let mut cleared = Vec::new();

    for call in all_calls() {
        let mine = cell(&order_status, call);
        let peer_reports = |status: OrderStatus| {
            wv.online_peers().any(|peer| cell(&peer.order_status, call) == status)
        };

        let advance = match mine {
            OrderStatus::None => peer_reports(OrderStatus::Requested),
            OrderStatus::Requested => peer_reports(OrderStatus::Completing),
            OrderStatus::Completing => wv.is_alone() || !peer_reports(OrderStatus::Requested),
        };

        if advance {
            let next = mine.advanced();
            set_cell(&mut order_status, call, next);
            if next == OrderStatus::None {
                cleared.push(call);
            }
        }
    }

    Reconciliation { order_status, cleared }
}
