//! Canonical hashing.
//!
//! Deterministic serialization + SHA-256 over the whole state or any single
//! collection. Field order is fixed: the schema version first, then the
//! collections in slot order, each serialized through its serde layout.
//! Collections keep their stored order (order is meaningful: requests and
//! events are newest first).

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{BridgeState, Collection};
use crate::STATE_SCHEMA_VERSION;

/// Canonical serialization of the state to compact UTF-8 JSON bytes.
pub fn canonical_serialize(state: &BridgeState) -> Result<Vec<u8>, serde_json::Error> {
    let value = build_canonical_value(state)?;
    serde_json::to_vec(&value)
}

/// SHA-256 of `canonical_serialize`. Lowercase hex.
pub fn canonical_hash(state: &BridgeState) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(&canonical_serialize(state)?))
}

/// Compact JSON of one collection, the same bytes used for its checksum.
pub fn collection_json(state: &BridgeState, collection: Collection) -> Result<String, serde_json::Error> {
    serde_json::to_string(&collection_value(state, collection)?)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Stable key of a collection inside the canonical document.
pub fn collection_key(collection: Collection) -> &'static str {
    match collection {
        Collection::Hospitals => "hospitals",
        Collection::Inventory => "inventory",
        Collection::Requests => "requests",
        Collection::Camps => "camps",
        Collection::Donors => "donors",
        Collection::Registrants => "registrants",
        Collection::Vehicles => "vehicles",
        Collection::LogisticsEvents => "logisticsEvents",
    }
}

fn collection_value(state: &BridgeState, collection: Collection) -> Result<Value, serde_json::Error> {
    match collection {
        Collection::Hospitals => to_value(&state.hospitals),
        Collection::Inventory => to_value(&state.inventory),
        Collection::Requests => to_value(&state.requests),
        Collection::Camps => to_value(&state.camps),
        Collection::Donors => to_value(&state.donors),
        Collection::Registrants => to_value(&state.registrants),
        Collection::Vehicles => to_value(&state.vehicles),
        Collection::LogisticsEvents => to_value(&state.logistics_events),
    }
}

fn to_value<T: Serialize + ?Sized>(v: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(v)
}

/// Uses `serde_json::Map` with insertion order preserved.
fn build_canonical_value(state: &BridgeState) -> Result<Value, serde_json::Error> {
    let mut root = Map::new();
    root.insert(
        "schemaVersion".to_string(),
        Value::Number(STATE_SCHEMA_VERSION.into()),
    );
    for collection in Collection::ALL {
        root.insert(
            collection_key(collection).to_string(),
            collection_value(state, collection)?,
        );
    }
    Ok(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::create_seed_state;
    use chrono::{TimeZone, Utc};

    #[test]
    fn hash_is_stable_and_sensitive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let a = create_seed_state(now);
        let b = create_seed_state(now);
        let ha = canonical_hash(&a).unwrap();
        assert_eq!(ha, canonical_hash(&b).unwrap());
        assert_eq!(ha.len(), 64);
        assert!(ha.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let mut c = a.clone();
        c.inventory[0].quantity += 1;
        assert_ne!(ha, canonical_hash(&c).unwrap());
    }

    #[test]
    fn schema_version_comes_first() {
        let bytes = canonical_serialize(&BridgeState::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\"schemaVersion\":1,\"hospitals\":[]"));
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
