//! Polling threads for the elevator server.
//!
//! Each function runs forever on its own OS thread and sends a value only when the polled
//! input changes. They stop when the receiving end of their channel is dropped.

use crossbeam_channel as cbc;
use std::thread;
use std::time;

use crate::config;
use crate::print;

use super::{elev, CallButton, CallType};

/// Sends a [CallButton] on every rising edge of any call button
pub fn call_buttons(elev: elev::Elevator, ch: cbc::Sender<CallButton>, period: time::Duration) {
    let mut prev = [[false; config::NUM_BUTTON_TYPES]; config::NUM_FLOORS];
    loop {
        for f in 0..elev.num_floors.min(config::NUM_FLOORS as u8) {
            for call_type in CallType::ALL {
                let v = match elev.call_button(f, call_type as u8) {
                    Ok(v) => v,
                    Err(e) => {
                        print::err(format!("Polling call button failed: {:#}", e));
                        continue;
                    }
                };
                if v && prev[f as usize][call_type.index()] != v {
                    if ch.send(CallButton::new(call_type, f)).is_err() {
                        return;
                    }
                }
                prev[f as usize][call_type.index()] = v;
            }
        }
        thread::sleep(period)
    }
}

/// Sends the floor number every time the floor sensor reports a new floor
pub fn floor_sensor(elev: elev::Elevator, ch: cbc::Sender<u8>, period: time::Duration) {
    let mut prev = u8::MAX;
    loop {
        match elev.floor_sensor() {
            Ok(Some(f)) if f != prev => {
                if ch.send(f).is_err() {
                    return;
                }
                prev = f;
            }
            Ok(_) => {}
            Err(e) => print::err(format!("Polling floor sensor failed: {:#}", e)),
        }
        thread::sleep(period)
    }
}
