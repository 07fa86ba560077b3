//! The elevator state machine.
//!
//! [Esm] owns the car's [ElevatorState], its three timers and the outputs to the hardware and
//! the rest of the program. Every `on_*` handler runs one transition to completion; nothing in
//! here awaits except [Esm::next_timeout].
//!
//! | state      | event            | result                                                  |
//! |------------|------------------|---------------------------------------------------------|
//! | `Idle`     | order here       | door opens                                              |
//! | `Idle`     | order elsewhere  | `Moving` towards it                                     |
//! | `DoorOpen` | order here       | door re-opens, order served                             |
//! | `Moving`   | floor arrival    | door opens if the stop condition holds                  |
//! | `DoorOpen` | door timeout     | door re-opens, or closes to `Moving` / `Idle`           |
//! | `Moving`   | motor-loss       | `Undefined` until the next floor arrival                |
//! | any        | watchdog         | dispatch is asked to re-issue outstanding orders        |

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::backup;
use crate::config;
use crate::elevio::{CallButton, CallType, HardwareCommand, MotorDirection};
use crate::print;
use crate::world_view::{all_calls, cell, set_cell, ElevatorState, Heading, MotionState};

use super::{lights, request, timer};


/// Where the state machine sends its side effects
#[derive(Debug, Clone)]
pub struct EsmOutputs {
    /// Motor and lamp commands
    pub hw_tx: mpsc::UnboundedSender<HardwareCommand>,
    /// Every new [ElevatorState], to replication
    pub state_tx: mpsc::UnboundedSender<ElevatorState>,
    /// Calls served by opening the door, to replication
    pub completed_tx: mpsc::UnboundedSender<CallButton>,
    /// Watchdog expiries, to dispatch
    pub watchdog_tx: mpsc::UnboundedSender<()>,
}

/// Timer that expired
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    DoorTimeout,
    Watchdog,
    MotorLoss,
}

/// The elevator state machine of this car
pub struct Esm {
    elevator: ElevatorState,
    door_timer: timer::Timer,
    watchdog_timer: timer::Timer,
    motor_loss_timer: timer::Timer,
    out: EsmOutputs,
    backup_path: Option<PathBuf>,
    last_published: Option<ElevatorState>,
}

impl Esm {
    /// Creates an idle car at `init_floor`, heading up.
    ///
    /// The watchdog is armed from the start and stays armed for the lifetime of the car, so an
    /// idle car keeps asking dispatch to re-issue orders. The door and motor-loss timers start
    /// stopped. Without a `backup_path` the queue is never persisted.
    pub fn new(init_floor: u8, out: EsmOutputs, backup_path: Option<PathBuf>) -> Self {
        let mut watchdog_timer = timer::new(config::WATCHDOG_TIMER_DURATION);
        watchdog_timer.timer_start();
        Self {
            elevator: ElevatorState::new(init_floor.min(config::NUM_FLOORS as u8 - 1)),
            door_timer: timer::new(config::DOOR_TIMER_DURATION),
            watchdog_timer,
            motor_loss_timer: timer::new(config::MOTOR_LOSS_TIMER_DURATION),
            out,
            backup_path,
            last_published: None,
        }
    }

    /// Current state of the car
    pub fn elevator(&self) -> &ElevatorState {
        &self.elevator
    }

    /// Re-injects every call found in the backup file as a new order, and relights its lamp.
    pub fn restore_backup(&mut self) {
        let Some(path) = self.backup_path.clone() else {
            self.publish();
            return;
        };
        let restored = backup::restore_or_empty(&path);
        for call in all_calls().filter(|call| cell(&restored, *call)) {
            print::info(format!("Re-injecting {:?} from backup", call));
            lights::set_button_light(&self.out.hw_tx, call, true);
            self.on_new_order(call);
        }
        self.persist();
        self.publish();
    }

    /// A confirmed order for this car.
    pub fn on_new_order(&mut self, order: CallButton) {
        if order.floor as usize >= config::NUM_FLOORS {
            print::warn(format!("Ignoring order outside the building: {:?}", order));
            return;
        }
        set_cell(&mut self.elevator.local_queue, order, true);
        self.persist();

        match self.elevator.motion {
            MotionState::Idle => {
                if request::here(&self.elevator) {
                    self.open_door();
                } else {
                    self.elevator.heading = request::choose_heading(&self.elevator);
                    self.start_moving();
                    self.watchdog_timer.timer_start();
                }
            }
            MotionState::DoorOpen => {
                if order.floor == self.elevator.floor {
                    self.open_door();
                }
            }
            MotionState::Moving | MotionState::Undefined => {}
        }
        self.publish();
    }

    /// The floor sensor saw `floor`.
    pub fn on_floor_arrival(&mut self, floor: u8) {
        if floor as usize >= config::NUM_FLOORS {
            print::warn(format!("Floor sensor reported floor {} outside the building", floor));
            return;
        }
        self.elevator.floor = floor;
        lights::set_floor_indicator(&self.out.hw_tx, floor);

        match self.elevator.motion {
            MotionState::Moving | MotionState::Undefined => {
                self.motor_loss_timer.timer_start();
                if floor == 0 {
                    self.elevator.heading = Heading::Up;
                } else if floor as usize == config::NUM_FLOORS - 1 {
                    self.elevator.heading = Heading::Down;
                }
                if self.elevator.motion == MotionState::Undefined {
                    print::ok(format!("Motor back, floor {}", floor));
                    self.elevator.motion = MotionState::Moving;
                }
                if request::should_stop(&self.elevator) {
                    self.open_door();
                }
            }
            MotionState::Idle | MotionState::DoorOpen => {}
        }
        self.publish();
    }

    /// Stops the car with the door open and serves the calls at this floor.
    fn open_door(&mut self) {
        self.elevator.motion = MotionState::DoorOpen;
        lights::set_motor(&self.out.hw_tx, MotorDirection::Stop);
        lights::set_door_open_light(&self.out.hw_tx);

        // Decided on the state before anything is cleared
        let before = self.elevator;
        for call_type in CallType::ALL {
            if request::should_clear(&before, call_type) {
                let call = CallButton::new(call_type, before.floor);
                set_cell(&mut self.elevator.local_queue, call, false);
                lights::set_button_light(&self.out.hw_tx, call, false);
                if self.out.completed_tx.send(call).is_err() {
                    print::warn(format!("Completion of {:?} not delivered", call));
                }
            }
        }
        self.persist();

        self.door_timer.timer_start();
        self.watchdog_timer.timer_start();
        self.motor_loss_timer.timer_stop();
    }

    /// The door has been open for the full door time.
    pub fn on_door_timeout(&mut self) {
        self.door_timer.timer_stop();
        if self.elevator.motion != MotionState::DoorOpen {
            return;
        }

        self.elevator.heading = request::choose_heading(&self.elevator);
        let stop = request::should_stop(&self.elevator);
        if stop && request::here(&self.elevator) {
            self.open_door();
            self.publish();
            return;
        }

        lights::clear_door_open_light(&self.out.hw_tx);
        self.watchdog_timer.timer_start();
        if stop {
            self.elevator.motion = MotionState::Idle;
        } else {
            self.start_moving();
        }
        self.publish();
    }

    /// No floor arrival within the motor-loss time while moving.
    pub fn on_motor_loss(&mut self) {
        self.motor_loss_timer.timer_stop();
        if self.elevator.motion == MotionState::Moving {
            print::cosmic_err(format!("Motor lost between floors, last floor {}", self.elevator.floor));
            self.elevator.motion = MotionState::Undefined;
            self.publish();
        }
    }

    /// Rearms the watchdog and asks dispatch to re-issue its orders.
    pub fn on_watchdog(&mut self) {
        self.watchdog_timer.timer_start();
        if self.out.watchdog_tx.send(()).is_err() {
            print::warn("Watchdog signal not delivered".to_string());
        }
    }

    /// Runs the handler of an expired timer
    pub fn on_timeout(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::DoorTimeout => self.on_door_timeout(),
            TimerEvent::Watchdog => self.on_watchdog(),
            TimerEvent::MotorLoss => self.on_motor_loss(),
        }
    }

    /// Completes when the first armed timer expires
    pub async fn next_timeout(&self) -> TimerEvent {
        tokio::select! {
            _ = self.door_timer.wait() => TimerEvent::DoorTimeout,
            _ = self.motor_loss_timer.wait() => TimerEvent::MotorLoss,
            _ = self.watchdog_timer.wait() => TimerEvent::Watchdog,
        }
    }

    fn start_moving(&mut self) {
        self.elevator.motion = MotionState::Moving;
        lights::set_motor(&self.out.hw_tx, self.elevator.heading.motor_direction());
        self.motor_loss_timer.timer_start();
    }

    fn persist(&self) {
        if let Some(path) = &self.backup_path {
            if let Err(e) = backup::write_backup(path, &self.elevator.local_queue) {
                print::warn(format!("Backup skipped: {:#}", e));
            }
        }
    }

    /// Sends the state to replication if it changed since the last send
    fn publish(&mut self) {
        if self.last_published == Some(self.elevator) {
            return;
        }
        if self.out.state_tx.send(self.elevator).is_err() {
            print::warn("Local elevator state not delivered".to_string());
        }
        self.last_published = Some(self.elevator);
    }
}
