//! ## Local elevator
//!
//! Runs the state machine of this car as its own task. The task blocks on whichever comes
//! first: a confirmed order from dispatch, a floor arrival from the hardware, or one of the
//! state machine's timers.

pub mod fsm;
pub mod request;
pub mod timer;
pub mod lights;

use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::elevio::CallButton;
use crate::print;


/// Runs the state machine of this car until one of its inputs closes.
///
/// ## Parameters
/// - `init_floor`: Floor the hardware stopped at during initialization.
/// - `backup_path`: File the local queue is persisted to and restored from.
/// - `new_order_rx`: Orders this car should serve.
/// - `floor_rx`: Floor sensor arrivals.
/// - `outputs`: Hardware commands, state, completions and watchdog signals.
pub async fn run_local_elevator(
    init_floor: u8,
    backup_path: Option<PathBuf>,
    mut new_order_rx: mpsc::UnboundedReceiver<CallButton>,
    mut floor_rx: mpsc::UnboundedReceiver<u8>,
    outputs: fsm::EsmOutputs,
) {
    let mut esm = fsm::Esm::new(init_floor, outputs, backup_path);
    esm.restore_backup();

    loop {
        tokio::select! {
            order = new_order_rx.recv() => match order {
                Some(order) => esm.on_new_order(order),
                None => break,
            },
            floor = floor_rx.recv() => match floor {
                Some(floor) => esm.on_floor_arrival(floor),
                None => break,
            },
            event = esm.next_timeout() => esm.on_timeout(event),
        }
    }
    print::warn("Local elevator stopped, input closed".to_string());
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::elevio::{CallType, HardwareCommand, MotorDirection};
    use crate::world_view::{ElevatorState, MotionState};
    use tokio::time::{advance, Duration};

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn serves_hall_call_and_returns_to_idle() {
        let (order_tx, order_rx) = mpsc::unbounded_channel();
        let (floor_tx, floor_rx) = mpsc::unbounded_channel();
        let (hw_tx, mut hw_rx) = mpsc::unbounded_channel();
        let (state_tx, mut state_rx) = mpsc::unbounded_channel::<ElevatorState>();
        let (completed_tx, mut completed_rx) = mpsc::unbounded_channel();
        let (watchdog_tx, _watchdog_rx) = mpsc::unbounded_channel();
        let outputs = fsm::EsmOutputs { hw_tx, state_tx, completed_tx, watchdog_tx };
        tokio::spawn(run_local_elevator(0, None, order_rx, floor_rx, outputs));

        let call = CallButton::new(CallType::HallUp, 2);
        order_tx.send(call).unwrap();
        settle().await;
        floor_tx.send(1).unwrap();
        floor_tx.send(2).unwrap();
        settle().await;
        assert_eq!(completed_rx.try_recv().unwrap(), call);

        advance(config::DOOR_TIMER_DURATION + Duration::from_millis(10)).await;
        settle().await;

        let mut last = None;
        while let Ok(state) = state_rx.try_recv() {
            last = Some(state);
        }
        let last = last.unwrap();
        assert_eq!(last.motion, MotionState::Idle);
        assert_eq!(last.floor, 2);

        let mut cmds = Vec::new();
        while let Ok(cmd) = hw_rx.try_recv() {
            cmds.push(cmd);
        }
        assert!(cmds.contains(&HardwareCommand::SetMotor(MotorDirection::Up)));
        assert!(cmds.contains(&HardwareCommand::SetButtonLamp(call, false)));
        assert_eq!(cmds.last(), Some(&HardwareCommand::SetDoorLamp(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn motor_loss_and_watchdog_fire_on_time() {
        let (order_tx, order_rx) = mpsc::unbounded_channel();
        let (_floor_tx, floor_rx) = mpsc::unbounded_channel();
        let (hw_tx, _hw_rx) = mpsc::unbounded_channel();
        let (state_tx, mut state_rx) = mpsc::unbounded_channel::<ElevatorState>();
        let (completed_tx, _completed_rx) = mpsc::unbounded_channel();
        let (watchdog_tx, mut watchdog_rx) = mpsc::unbounded_channel();
        let outputs = fsm::EsmOutputs { hw_tx, state_tx, completed_tx, watchdog_tx };
        tokio::spawn(run_local_elevator(0, None, order_rx, floor_rx, outputs));

        order_tx.send(CallButton::new(CallType::Cab, 3)).unwrap();
        settle().await;

        advance(config::MOTOR_LOSS_TIMER_DURATION + Duration::from_millis(10)).await;
        settle().await;
        let mut last = None;
        while let Ok(state) = state_rx.try_recv() {
            last = Some(state);
        }
        assert_eq!(last.map(|s| s.motion), Some(MotionState::Undefined));
        assert!(watchdog_rx.try_recv().is_err());

        advance(config::WATCHDOG_TIMER_DURATION).await;
        settle().await;
        assert!(watchdog_rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_car_keeps_signalling_watchdog() {
        let (_order_tx, order_rx) = mpsc::unbounded_channel();
        let (_floor_tx, floor_rx) = mpsc::unbounded_channel();
        let (hw_tx, _hw_rx) = mpsc::unbounded_channel();
        let (state_tx, _state_rx) = mpsc::unbounded_channel();
        let (completed_tx, _completed_rx) = mpsc::unbounded_channel();
        let (watchdog_tx, mut watchdog_rx) = mpsc::unbounded_channel();
        let outputs = fsm::EsmOutputs { hw_tx, state_tx, completed_tx, watchdog_tx };
        tokio::spawn(run_local_elevator(0, None, order_rx, floor_rx, outputs));
        settle().await;

        for _ in 0..2 {
            assert!(watchdog_rx.try_recv().is_err());
            advance(config::WATCHDOG_TIMER_DURATION + Duration::from_millis(10)).await;
            settle().await;
            assert!(watchdog_rx.try_recv().is_ok());
        }
    }
}
