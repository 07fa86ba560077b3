//! Lamp and motor commands.
//!
//! Small wrappers queuing [HardwareCommand]s. A closed command channel means the hardware is
//! gone, which is only logged.

use tokio::sync::mpsc;

use crate::elevio::{CallButton, HardwareCommand, MotorDirection};
use crate::print;


fn send(hw_tx: &mpsc::UnboundedSender<HardwareCommand>, cmd: HardwareCommand) {
    if hw_tx.send(cmd).is_err() {
        print::warn(format!("Hardware command channel closed, dropped {:?}", cmd));
    }
}

/// Turns the lamp of `call` on or off
pub fn set_button_light(hw_tx: &mpsc::UnboundedSender<HardwareCommand>, call: CallButton, on: bool) {
    send(hw_tx, HardwareCommand::SetButtonLamp(call, on));
}

/// The function sets the door open light on
pub fn set_door_open_light(hw_tx: &mpsc::UnboundedSender<HardwareCommand>) {
    send(hw_tx, HardwareCommand::SetDoorLamp(true));
}

/// The function sets the door open light off
pub fn clear_door_open_light(hw_tx: &mpsc::UnboundedSender<HardwareCommand>) {
    send(hw_tx, HardwareCommand::SetDoorLamp(false));
}

/// Shows `floor` on the floor indicator
pub fn set_floor_indicator(hw_tx: &mpsc::UnboundedSender<HardwareCommand>, floor: u8) {
    send(hw_tx, HardwareCommand::SetFloorIndicator(floor));
}

/// Queues a motor command
pub fn set_motor(hw_tx: &mpsc::UnboundedSender<HardwareCommand>, dirn: MotorDirection) {
    send(hw_tx, HardwareCommand::SetMotor(dirn));
}
