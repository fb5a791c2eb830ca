//! Ledger entry types.
//!
//! `AuditEvent` is the caller-supplied payload handed to the appender.
//! `AuditEntry` is the immutable, hash-linked row the ledger stores — once
//! written it is never updated or deleted; corrections are appended as new
//! entries referencing the corrected one. `ChainTail` is the per-tenant
//! tail-pointer record the append protocol compare-and-swaps on.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one isolated chain. Every tenant owns an independent chain;
/// sequence numbers and hash links never cross tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A compliance-relevant action as submitted by the ingestion layer.
///
/// Free-form but schema-constrained: the codec rejects events with empty
/// required fields or metadata values outside the supported set before any
/// hash is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Who performed the action.
    pub actor: String,

    /// Stable action identifier, e.g. `"policy.evaluate"` or `"data.read"`.
    pub action: String,

    /// Resource type label, e.g. `"regulation"`.
    pub resource_type: String,

    /// Resource identifier within its type.
    pub resource_id: String,

    /// Structured detail payload. Keys serialize sorted; values are limited
    /// to strings, booleans, integers, null, and arrays/objects of the same.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl AuditEvent {
    /// Build an event with an empty metadata map.
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a metadata key/value pair, builder style.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// One immutable entry in a tenant's hash chain.
///
/// Modifying any field — including metadata — changes the recomputed
/// `payload_hash` or `entry_hash` and is detected by the verifier. The
/// `timestamp` is evidentiary only: sequence numbers are the sole ordering
/// authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The chain this entry belongs to.
    pub tenant_id: TenantId,

    /// Strictly increasing position in the chain, starting at 1. Gapless:
    /// a missing sequence is itself evidence of tampering or data loss.
    pub sequence: u64,

    /// Wall-clock recording time (UTC), non-decreasing within a chain.
    pub timestamp: DateTime<Utc>,

    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// The codec version whose canonicalization rules produced
    /// `payload_hash`. Historical entries keep verifying under the rules in
    /// force when they were written.
    pub codec_version: u16,

    /// SHA-256 hash (hex) of the canonicalized payload.
    pub payload_hash: String,

    /// `entry_hash` of the preceding entry, or `GENESIS_HASH` for sequence 1.
    pub previous_hash: String,

    /// SHA-256 hash (hex) binding this entry to its payload and predecessor.
    /// This is what the next entry links to.
    pub entry_hash: String,
}

impl AuditEntry {
    /// The sentinel `previous_hash` for the first entry in every chain.
    ///
    /// 64 hex zeros — a value that can never be the SHA-256 of real data,
    /// making genesis detection unambiguous.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// Reconstruct the caller-facing event payload from a stored entry.
    pub fn event(&self) -> AuditEvent {
        AuditEvent {
            actor: self.actor.clone(),
            action: self.action.clone(),
            resource_type: self.resource_type.clone(),
            resource_id: self.resource_id.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Per-tenant tail-pointer record: `(tenant_id) -> (last_sequence,
/// last_entry_hash, last_timestamp, version)`.
///
/// The `version` field backs optimistic concurrency: a commit carries the
/// version observed at tail read and is refused if the stored version has
/// since advanced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTail {
    /// Sequence of the newest committed entry; 0 for an empty chain.
    pub last_sequence: u64,

    /// `entry_hash` of the newest entry, or `GENESIS_HASH` when empty.
    pub last_entry_hash: String,

    /// Timestamp of the newest entry; new entries are clamped to be
    /// non-decreasing against this.
    pub last_timestamp: DateTime<Utc>,

    /// Monotonic commit counter used for the compare-and-swap check.
    pub version: u64,
}

impl ChainTail {
    /// The tail of a chain with no entries yet.
    pub fn genesis() -> Self {
        Self {
            last_sequence: 0,
            last_entry_hash: AuditEntry::GENESIS_HASH.to_string(),
            last_timestamp: DateTime::UNIX_EPOCH,
            version: 0,
        }
    }
}
