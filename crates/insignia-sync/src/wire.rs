//! Hidden-set wire format helpers.

use crate::hidden_set::HiddenSet;
use insignia_core::{EntityId, WireError};
use serde::{Deserialize, Serialize};

/// Current wire schema version.
pub const HIDDEN_SET_WIRE_SCHEMA_VERSION: u16 = 1;

/// The replicated field as it travels between participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenSetWireMessage {
    /// Must equal `HIDDEN_SET_WIRE_SCHEMA_VERSION`
    pub schema_version: u16,
    /// Participant that published this snapshot
    pub writer: EntityId,
    /// Hidden entities; order is insignificant
    pub entities: Vec<EntityId>,
}

impl HiddenSetWireMessage {
    /// Snapshot `set` as published by `writer`.
    pub fn snapshot(writer: EntityId, set: &HiddenSet) -> Self {
        Self {
            schema_version: HIDDEN_SET_WIRE_SCHEMA_VERSION,
            writer,
            entities: set.to_entries(),
        }
    }

    /// Rebuild the set, dropping duplicate entries.
    ///
    /// Returns the set and the number of duplicates that were dropped.
    pub fn into_hidden_set(self) -> (HiddenSet, usize) {
        HiddenSet::from_entries(self.entities)
    }

    /// Human-readable rendering for logs and reports.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unrenderable: {e}>"))
    }
}

/// Encode a message with bincode.
pub fn serialize_message(msg: &HiddenSetWireMessage) -> Result<Vec<u8>, WireError> {
    bincode::serialize(msg).map_err(|e| WireError::Encode(e.to_string()))
}

/// Decode a message, rejecting unknown schema versions.
pub fn deserialize_message(bytes: &[u8]) -> Result<HiddenSetWireMessage, WireError> {
    let msg: HiddenSetWireMessage =
        bincode::deserialize(bytes).map_err(|e| WireError::Decode(e.to_string()))?;
    if msg.schema_version != HIDDEN_SET_WIRE_SCHEMA_VERSION {
        return Err(WireError::UnsupportedSchema {
            found: msg.schema_version,
            expected: HIDDEN_SET_WIRE_SCHEMA_VERSION,
        });
    }
    Ok(msg)
}
