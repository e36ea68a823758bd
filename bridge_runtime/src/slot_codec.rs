//! Slot codec: versioned, checksummed envelopes around one collection.
//!
//! Pure codec layer. No I/O.
//!
//! - `encode_slot`:   collection -> `{"version":1,"checksum":"…","data":[…]}`
//! - `decode_slot`:   envelope -> collection (strict version and checksum)
//! - `encode_state` / `decode_into`: per-collection dispatch over `BridgeState`
//!
//! The checksum is the SHA-256 of the compact JSON of `data`, the same bytes
//! `bridge_core::hashing::collection_json` produces.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use bridge_core::domain::{BridgeState, Collection};
use bridge_core::hashing::{collection_json, sha256_hex};
use bridge_core::STATE_SCHEMA_VERSION;

use crate::error::PersistError;
use crate::storage::slot_name;

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: u32,
    checksum: String,
    data: &'a RawValue,
}

#[derive(Deserialize)]
struct EnvelopeIn<'a> {
    version: u32,
    checksum: String,
    #[serde(borrow)]
    data: &'a RawValue,
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Envelope for one collection of `state`.
pub fn encode_state(state: &BridgeState, collection: Collection) -> Result<String, PersistError> {
    let slot = slot_name(collection);
    let data = collection_json(state, collection).map_err(|e| PersistError::Serialization {
        slot: slot.to_string(),
        message: e.to_string(),
    })?;
    wrap(slot, data)
}

/// Envelope for an arbitrary serializable collection.
pub fn encode_slot<T: Serialize + ?Sized>(slot: &str, value: &T) -> Result<String, PersistError> {
    let data = serde_json::to_string(value).map_err(|e| PersistError::Serialization {
        slot: slot.to_string(),
        message: e.to_string(),
    })?;
    wrap(slot, data)
}

fn wrap(slot: &str, data: String) -> Result<String, PersistError> {
    let raw = RawValue::from_string(data).map_err(|e| PersistError::Serialization {
        slot: slot.to_string(),
        message: e.to_string(),
    })?;
    let envelope = EnvelopeOut {
        version: STATE_SCHEMA_VERSION,
        checksum: sha256_hex(raw.get().as_bytes()),
        data: &raw,
    };
    serde_json::to_string(&envelope).map_err(|e| PersistError::Serialization {
        slot: slot.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode an envelope. Rejects unknown versions and checksum mismatches.
pub fn decode_slot<T: DeserializeOwned>(slot: &str, contents: &str) -> Result<T, PersistError> {
    let envelope: EnvelopeIn<'_> =
        serde_json::from_str(contents).map_err(|e| PersistError::Deserialization {
            slot: slot.to_string(),
            message: e.to_string(),
        })?;

    if envelope.version != STATE_SCHEMA_VERSION {
        return Err(PersistError::VersionMismatch {
            slot: slot.to_string(),
            found: envelope.version,
            expected: STATE_SCHEMA_VERSION,
        });
    }

    let computed = sha256_hex(envelope.data.get().as_bytes());
    if computed != envelope.checksum {
        return Err(PersistError::ChecksumMismatch {
            slot: slot.to_string(),
            stored: envelope.checksum,
            computed,
        });
    }

    serde_json::from_str(envelope.data.get()).map_err(|e| PersistError::Deserialization {
        slot: slot.to_string(),
        message: e.to_string(),
    })
}

/// Decode the envelope for `collection` and replace that collection in `state`.
pub fn decode_into(
    state: &mut BridgeState,
    collection: Collection,
    contents: &str,
) -> Result<(), PersistError> {
    let slot = slot_name(collection);
    match collection {
        Collection::Hospitals => state.hospitals = decode_slot(slot, contents)?,
        Collection::Inventory => state.inventory = decode_slot(slot, contents)?,
        Collection::Requests => state.requests = decode_slot(slot, contents)?,
        Collection::Camps => state.camps = decode_slot(slot, contents)?,
        Collection::Donors => state.donors = decode_slot(slot, contents)?,
        Collection::Registrants => state.registrants = decode_slot(slot, contents)?,
        Collection::Vehicles => state.vehicles = decode_slot(slot, contents)?,
        Collection::LogisticsEvents => state.logistics_events = decode_slot(slot, contents)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
