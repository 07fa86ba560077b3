//! ## Network module
//!
//! Everything that leaves or enters the process over the network, plus the replication of the
//! fleet state that is built on top of it.
//!
//! ## Sub-modules
//! - [peers]: heartbeats and peer liveness.
//! - [udp_broadcast]: car state snapshots.
//! - [local_network]: the replication engine keeping the [crate::world_view::WorldView].
//!
//! Transport is best-effort: packets may be lost, duplicated or reordered. Nothing above this
//! module relies on delivery, every car simply rebroadcasts its state periodically.

pub mod peers;
pub mod udp_broadcast;
pub mod local_network;

pub use peers::PeerUpdate;

use anyhow::Context;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};

use crate::config;
use crate::world_view::CarState;


/// Handles to a running transport
pub struct Transport {
    /// Peer joins and losses
    pub peer_update_rx: mpsc::UnboundedReceiver<PeerUpdate>,
    /// Snapshots heard on the network
    pub incoming_rx: mpsc::UnboundedReceiver<CarState>,
    /// Snapshots to broadcast
    pub outgoing_tx: mpsc::UnboundedSender<CarState>,
    /// Heartbeats are only sent while this holds `true`
    pub enable_tx: watch::Sender<bool>,
}

/// Creates a non blocking UDP socket with reusable address and broadcast enabled,
/// bound to `port` on [config::BC_LISTEN_ADDR].
///
/// Must be called from within a tokio runtime.
pub fn broadcast_socket(port: u16) -> anyhow::Result<UdpSocket> {
    let addr: SocketAddr = format!("{}:{}", config::BC_LISTEN_ADDR, port)
        .parse()
        .context("Invalid listen address")?;
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, None).context("Could not create socket")?;
    socket.set_nonblocking(true)?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.bind(&addr.into())
        .with_context(|| format!("Could not bind UDP port {}", port))?;
    UdpSocket::from_std(socket.into()).context("Could not hand socket to tokio")
}

fn broadcast_target(port: u16) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", config::BC_ADDR, port)
        .parse()
        .context("Invalid broadcast address")
}

/// Opens the peer and snapshot sockets and spawns their four tasks.
///
/// Heartbeats carry `identity` and start disabled.
pub fn start_transport(identity: &str) -> anyhow::Result<Transport> {
    let peer_target = broadcast_target(config::PEERS_PORT)?;
    let snapshot_target = broadcast_target(config::BCAST_PORT)?;

    let peer_tx_socket = broadcast_socket(0)?;
    let peer_rx_socket = broadcast_socket(config::PEERS_PORT)?;
    let snapshot_tx_socket = broadcast_socket(0)?;
    let snapshot_rx_socket = broadcast_socket(config::BCAST_PORT)?;

    let (enable_tx, enable_rx) = watch::channel(false);
    let (peer_update_tx, peer_update_rx) = mpsc::unbounded_channel();
    let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
    let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

    tokio::spawn(peers::peer_transmitter(peer_tx_socket, peer_target, identity.to_string(), enable_rx));
    tokio::spawn(peers::peer_receiver(peer_rx_socket, peer_update_tx));
    tokio::spawn(udp_broadcast::start_udp_broadcaster(snapshot_tx_socket, snapshot_target, outgoing_rx));
    tokio::spawn(udp_broadcast::start_udp_listener(snapshot_rx_socket, incoming_tx));

    Ok(Transport { peer_update_rx, incoming_rx, outgoing_tx, enable_tx })
}
