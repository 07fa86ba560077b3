//! The shared data model.
//!
//! [WorldView] is the merged view of every car in the fleet as known to this process.
//! Slot 0 always holds "my" [CarState], which is the only slot this process ever edits
//! field by field. The other slots are mirrors of peers and are only ever replaced wholesale
//! by a snapshot received from that peer.
//!
//! Every matrix is a fixed size array indexed `[call_type][floor]`, so copying a snapshot is a
//! plain structural copy and the dimensions can never change at runtime.

pub mod serial;
pub mod world_view_update;

use serde::{Serialize, Deserialize};
use crate::config;
use crate::elevio::{CallButton, CallType, MotorDirection};


/// Matrix with one cell per [CallButton]
pub type ButtonMatrix<T> = [[T; config::NUM_FLOORS]; config::NUM_BUTTON_TYPES];

/// Calls this car intends to serve
pub type LocalQueue = ButtonMatrix<bool>;

/// Replicated lifecycle of every call
pub type OrderStatusMatrix = ButtonMatrix<OrderStatus>;

/// An empty local queue
pub const EMPTY_QUEUE: LocalQueue = [[false; config::NUM_FLOORS]; config::NUM_BUTTON_TYPES];

/// An order-status matrix with every cell [OrderStatus::None]
pub const EMPTY_ORDER_STATUS: OrderStatusMatrix = [[OrderStatus::None; config::NUM_FLOORS]; config::NUM_BUTTON_TYPES];


#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// The current behaviour of an elevator
pub enum MotionState {
    Idle,
    Moving,
    DoorOpen,
    /// Motor commanded but no floor arrival seen in time. Position not trusted.
    Undefined,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Direction an elevator is taking calls in
pub enum Heading {
    Up,
    Down,
}

impl Heading {
    /// Motor command moving the car in this heading
    pub fn motor_direction(self) -> MotorDirection {
        match self {
            Heading::Up => MotorDirection::Up,
            Heading::Down => MotorDirection::Down,
        }
    }
}

/// Lifecycle of a call, replicated between cars.
///
/// The only way to change a status is [OrderStatus::advanced], so a cell can only ever go
/// `None -> Requested -> Completing -> None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// No known call
    #[default]
    None,
    /// Call made, waiting to be served
    Requested,
    /// Served by some car, waiting for every online car to see it
    Completing,
}

impl OrderStatus {
    /// The next status in the lifecycle
    pub fn advanced(self) -> OrderStatus {
        match self {
            OrderStatus::None => OrderStatus::Requested,
            OrderStatus::Requested => OrderStatus::Completing,
            OrderStatus::Completing => OrderStatus::None,
        }
    }
}

/// Reads the cell of `call` in `matrix`
pub fn cell<T: Copy>(matrix: &ButtonMatrix<T>, call: CallButton) -> T {
    matrix[call.call_type.index()][call.floor as usize]
}

/// Writes the cell of `call` in `matrix`
pub fn set_cell<T>(matrix: &mut ButtonMatrix<T>, call: CallButton, value: T) {
    matrix[call.call_type.index()][call.floor as usize] = value;
}

/// Every cell of a button matrix, in row-major order
pub fn all_calls() -> impl Iterator<Item = CallButton> {
    CallType::ALL.into_iter().flat_map(|call_type| {
        (0..config::NUM_FLOORS as u8).map(move |floor| CallButton::new(call_type, floor))
    })
}


/// The part of a car's state owned by its elevator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevatorState {
    /// What the car is doing
    pub motion: MotionState,

    /// Direction calls are being taken in
    pub heading: Heading,

    /// Last floor seen by the floor sensor
    pub floor: u8,

    /// Calls this car will serve: its own cab calls and the hall calls it won
    pub local_queue: LocalQueue,
}

impl ElevatorState {
    /// An idle car at `floor`, heading up, with nothing to do
    pub fn new(floor: u8) -> Self {
        Self {
            motion: MotionState::Idle,
            heading: Heading::Up,
            floor,
            local_queue: EMPTY_QUEUE,
        }
    }
}

impl Default for ElevatorState {
    fn default() -> Self {
        Self::new(0)
    }
}


/// Represents the replicated state of one car.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CarState {
    /// Unique identifier of the car. Empty for an unused slot.
    pub identity: String,

    /// Motion, heading, floor and local queue
    pub elevator: ElevatorState,

    /// Lifecycle of every call as known to this car
    pub order_status: OrderStatusMatrix,

    /// Liveness as last reported by the peer transport
    pub online: bool,
}

impl CarState {
    /// Creates an offline car state with the given identity
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            elevator: ElevatorState::default(),
            order_status: EMPTY_ORDER_STATUS,
            online: false,
        }
    }

    /// `true` if no peer has claimed this slot yet
    pub fn is_unused(&self) -> bool {
        self.identity.is_empty()
    }

    /// `true` if motion, heading, floor, queue or order status differ.
    /// Identity and liveness are not part of the comparison.
    pub fn has_core_change(&self, other: &CarState) -> bool {
        self.elevator != other.elevator || self.order_status != other.order_status
    }
}


/// Represents this process' view of the whole fleet.
///
/// Always holds [config::MAX_NUM_ELEVATORS] slots. Slot 0 is mine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorldView {
    /// Every slot of the fleet
    pub cars: Vec<CarState>,
}

impl WorldView {
    /// Creates a world view where only slot 0 has an identity
    pub fn new(my_identity: impl Into<String>) -> Self {
        let mut cars = vec![CarState::new(""); config::MAX_NUM_ELEVATORS];
        cars[0] = CarState::new(my_identity);
        Self { cars }
    }

    /// My own car state
    pub fn mine(&self) -> &CarState {
        &self.cars[0]
    }

    /// Mutable access to my own car state
    pub fn mine_mut(&mut self) -> &mut CarState {
        &mut self.cars[0]
    }

    /// Every slot except mine
    pub fn peers(&self) -> &[CarState] {
        &self.cars[1..]
    }

    /// Peers that are currently online
    pub fn online_peers(&self) -> impl Iterator<Item = &CarState> {
        let my_id = self.mine().identity.clone();
        self.peers().iter().filter(move |car| car.online && car.identity != my_id)
    }

    /// `true` if no other car is online
    pub fn is_alone(&self) -> bool {
        self.online_peers().next().is_none()
    }

    /// Index of the slot with the given identity
    pub fn slot_of(&self, identity: &str) -> Option<usize> {
        self.cars.iter().position(|car| !car.is_unused() && car.identity == identity)
    }
}
