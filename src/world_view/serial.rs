//! Wire format for [CarState] snapshots.
//!
//! A packet is the bytes of [config::KEY_STR] followed by the `bincode` encoding of the car
//! state. Packets without the key, or that decode to a state breaking the data model
//! invariants, are rejected.

use anyhow::{bail, Context};

use crate::config;
use crate::world_view::CarState;


/// Serializes a `CarState` into a broadcast packet.
pub fn serialize_car_state(state: &CarState) -> anyhow::Result<Vec<u8>> {
    let mut packet = config::KEY_STR.as_bytes().to_vec();
    let encoded = bincode::serialize(state).context("Serialization of car state failed")?;
    packet.extend_from_slice(&encoded);
    Ok(packet)
}

/// Deserializes a broadcast packet into a `CarState`.
///
/// ## Errors
/// - The packet does not start with [config::KEY_STR].
/// - The payload is not a valid `bincode` encoded `CarState`.
/// - The decoded floor is outside the building.
pub fn deserialize_car_state(data: &[u8]) -> anyhow::Result<CarState> {
    let key = config::KEY_STR.as_bytes();
    let Some(payload) = data.strip_prefix(key) else {
        bail!("Packet without key ({} bytes)", data.len());
    };
    let state: CarState = bincode::deserialize(payload).context("Deserialization of car state failed")?;
    if state.elevator.floor as usize >= config::NUM_FLOORS {
        bail!("Car {} reports floor {} outside the building", state.identity, state.elevator.floor);
    }
    Ok(state)
}
