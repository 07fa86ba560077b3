//! ## Car state snapshots over UDP broadcast
//!
//! The broadcaster sends every [CarState] it is handed. The listener forwards every valid
//! snapshot it hears, including this car's own echoes, which replication filters out.

use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::config;
use crate::print;
use crate::world_view::serial;
use crate::world_view::CarState;


/// This function starts and runs the UDP-broadcaster
///
/// ## Parameters
/// `socket`: Broadcast-enabled socket
/// `target`: Broadcast address and port
/// `outgoing_rx`: Car states to broadcast
///
/// ## Note
/// Runs until `outgoing_rx` is closed, and should be called asynchronously
pub async fn start_udp_broadcaster(socket: UdpSocket, target: SocketAddr, mut outgoing_rx: mpsc::UnboundedReceiver<CarState>) {
    while let Some(state) = outgoing_rx.recv().await {
        let packet = match serial::serialize_car_state(&state) {
            Ok(packet) => packet,
            Err(e) => {
                print::err(format!("Snapshot not encoded: {:#}", e));
                continue;
            }
        };
        if let Err(e) = socket.send_to(&packet, target).await {
            print::warn(format!("Snapshot not sent: {}", e));
        }
    }
}

/// Starts and runs the UDP-listener
///
/// ## Behaviour
/// - Continously reads on the socket
/// - Drops packets without [config::KEY_STR] or that fail to decode
/// - Sends every decoded [CarState] on `incoming_tx`
///
/// ## Note
/// Runs until `incoming_tx` is closed, and should be called asynchronously
pub async fn start_udp_listener(socket: UdpSocket, incoming_tx: mpsc::UnboundedSender<CarState>) {
    let mut buf = [0u8; config::UDP_BUFFER];
    loop {
        let len = match socket.recv_from(&mut buf).await {
            Ok((len, _)) => len,
            Err(e) => {
                print::warn(format!("Snapshot receive failed: {}", e));
                continue;
            }
        };
        match serial::deserialize_car_state(&buf[..len]) {
            Ok(state) => {
                if incoming_tx.send(state).is_err() {
                    return;
                }
            }
            Err(e) => print::warn(format!("Dropped snapshot: {:#}", e)),
        }
    }
}
