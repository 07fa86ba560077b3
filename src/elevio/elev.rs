//! TCP client for the elevator server.
//!
//! Follows the wire protocol of the TTK4145 driver, <https://github.com/TTK4145/driver-rust>.
//!
//! Every request is a 4-byte frame `[cmd, a, b, c]`; requests 6-9 are answered with a 4-byte frame.

use anyhow::{anyhow, Context};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

/// Motor byte for moving up
pub const DIRN_UP: u8 = 1;
/// Motor byte for moving down (`-1` as a byte)
pub const DIRN_DOWN: u8 = u8::MAX;
/// Motor byte for stopping
pub const DIRN_STOP: u8 = 0;

/// Handle to the elevator server. Cheap to clone, all clones share the same connection.
#[derive(Clone, Debug)]
pub struct Elevator {
    socket: Arc<Mutex<TcpStream>>,
    /// Number of floors the server is configured with
    pub num_floors: u8,
}

impl Elevator {
    /// Connects to the elevator server at `addr`
    pub fn init(addr: &str, num_floors: u8) -> anyhow::Result<Elevator> {
        let stream = TcpStream::connect(addr)
            .with_context(|| format!("TCP connect to {} failed", addr))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            socket: Arc::new(Mutex::new(stream)),
            num_floors,
        })
    }

    fn write(&self, frame: [u8; 4]) -> anyhow::Result<()> {
        let mut sock = self.socket.lock().map_err(|_| anyhow!("elevator socket poisoned"))?;
        sock.write_all(&frame)?;
        Ok(())
    }

    fn request(&self, frame: [u8; 4]) -> anyhow::Result<[u8; 4]> {
        let mut sock = self.socket.lock().map_err(|_| anyhow!("elevator socket poisoned"))?;
        sock.write_all(&frame)?;
        let mut buf = [0u8; 4];
        sock.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Sets the motor direction, see [DIRN_UP], [DIRN_DOWN], [DIRN_STOP]
    pub fn motor_direction(&self, dirn: u8) -> anyhow::Result<()> {
        self.write([1, dirn, 0, 0])
    }

    /// Turns the lamp of a call button on or off
    pub fn call_button_light(&self, floor: u8, call: u8, on: bool) -> anyhow::Result<()> {
        self.write([2, call, floor, on as u8])
    }

    /// Shows `floor` on the floor indicator
    pub fn floor_indicator(&self, floor: u8) -> anyhow::Result<()> {
        self.write([3, floor, 0, 0])
    }

    /// Turns the door open lamp on or off
    pub fn door_light(&self, on: bool) -> anyhow::Result<()> {
        self.write([4, on as u8, 0, 0])
    }

    /// Turns the stop button lamp on or off
    pub fn stop_button_light(&self, on: bool) -> anyhow::Result<()> {
        self.write([5, on as u8, 0, 0])
    }

    /// `true` while the given call button is held
    pub fn call_button(&self, floor: u8, call: u8) -> anyhow::Result<bool> {
        let buf = self.request([6, call, floor, 0])?;
        Ok(buf[1] != 0)
    }

    /// The floor the car is at, `None` between floors
    pub fn floor_sensor(&self) -> anyhow::Result<Option<u8>> {
        let buf = self.request([7, 0, 0, 0])?;
        if buf[1] != 0 {
            Ok(Some(buf[2]))
        } else {
            Ok(None)
        }
    }

    /// `true` while the stop button is held
    pub fn stop_button(&self) -> anyhow::Result<bool> {
        let buf = self.request([8, 0, 0, 0])?;
        Ok(buf[1] != 0)
    }

    /// `true` while the door is obstructed
    pub fn obstruction(&self) -> anyhow::Result<bool> {
        let buf = self.request([9, 0, 0, 0])?;
        Ok(buf[1] != 0)
    }
}
