//! ## Peer liveness over UDP broadcast
//!
//! Every car broadcasts a small heartbeat, [config::KEY_STR] followed by its identity, every
//! [config::PEER_INTERVAL] while transmitting is enabled. The receiver keeps the last instant
//! each identity was heard and reports a [PeerUpdate] whenever a peer appears or has been
//! silent for [config::PEER_TIMEOUT].

use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use crate::config;
use crate::print;


/// Change in the set of live peers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerUpdate {
    /// Every live identity, sorted
    pub peers: Vec<String>,
    /// Identity heard for the first time since it was last lost
    pub new: Option<String>,
    /// Identities that timed out
    pub lost: Vec<String>,
}

/// Last-heard bookkeeping of the peer receiver
#[derive(Debug)]
pub struct PeerTracker {
    timeout: Duration,
    last_seen: HashMap<String, Instant>,
}

impl PeerTracker {
    /// Creates an empty tracker
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, last_seen: HashMap::new() }
    }

    fn peers(&self) -> Vec<String> {
        let mut peers: Vec<String> = self.last_seen.keys().cloned().collect();
        peers.sort();
        peers
    }

    /// Records a heartbeat. Returns an update if `identity` was not live.
    pub fn heard(&mut self, identity: &str, now: Instant) -> Option<PeerUpdate> {
        let is_new = self.last_seen.insert(identity.to_string(), now).is_none();
        is_new.then(|| PeerUpdate {
            peers: self.peers(),
            new: Some(identity.to_string()),
            lost: Vec::new(),
        })
    }

    /// Drops every identity silent for longer than the timeout. Returns an update if any was.
    pub fn expire(&mut self, now: Instant) -> Option<PeerUpdate> {
        let timeout = self.timeout;
        let mut lost: Vec<String> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.duration_since(**seen) > timeout)
            .map(|(id, _)| id.clone())
            .collect();
        if lost.is_empty() {
            return None;
        }
        lost.sort();
        for id in &lost {
            self.last_seen.remove(id);
        }
        Some(PeerUpdate { peers: self.peers(), new: None, lost })
    }
}

/// Heartbeat packet for `identity`
pub fn encode_heartbeat(identity: &str) -> Vec<u8> {
    let mut packet = config::KEY_STR.as_bytes().to_vec();
    packet.extend_from_slice(identity.as_bytes());
    packet
}

/// Identity carried by a heartbeat packet. `None` for foreign or malformed packets.
pub fn decode_heartbeat(packet: &[u8]) -> Option<String> {
    let identity = packet.strip_prefix(config::KEY_STR.as_bytes())?;
    let identity = std::str::from_utf8(identity).ok()?;
    (!identity.is_empty()).then(|| identity.to_string())
}


/// Broadcasts heartbeats for `identity` while `enable_rx` holds `true`.
///
/// ## Note
/// Runs until the enable watch is dropped, and should be called asynchronously.
pub async fn peer_transmitter(socket: UdpSocket, target: SocketAddr, identity: String, enable_rx: watch::Receiver<bool>) {
    let packet = encode_heartbeat(&identity);
    let mut ticker = interval(config::PEER_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if enable_rx.has_changed().is_err() {
            return;
        }
        if !*enable_rx.borrow() {
            continue;
        }
        if let Err(e) = socket.send_to(&packet, target).await {
            print::warn(format!("Heartbeat not sent: {}", e));
        }
    }
}

/// Listens for heartbeats and reports every change in the set of live peers on `update_tx`.
///
/// ## Note
/// Runs until `update_tx` is closed, and should be called asynchronously.
pub async fn peer_receiver(socket: UdpSocket, update_tx: mpsc::UnboundedSender<PeerUpdate>) {
    let mut tracker = PeerTracker::new(config::PEER_TIMEOUT);
    let mut buf = [0u8; config::UDP_BUFFER];
    let mut ticker = interval(config::PEER_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let update = tokio::select! {
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, _)) => match decode_heartbeat(&buf[..len]) {
                    Some(identity) => tracker.heard(&identity, Instant::now()),
                    None => None,
                },
                Err(e) => {
                    print::warn(format!("Peer receive failed: {}", e));
                    None
                }
            },
            _ = ticker.tick() => tracker.expire(Instant::now()),
        };
        if let Some(update) = update {
            if update_tx.send(update).is_err() {
                return;
            }
        }
    }
}
