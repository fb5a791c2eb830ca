//! Canonical byte serialization and hashing.
//!
//! Two logically identical events must always hash identically, regardless
//! of metadata insertion order, numeric formatting, or incidental
//! whitespace. Every field that contributes to a hash is listed explicitly
//! so nothing is accidentally omitted.
//!
//! Canonical byte layout (codec version 1):
//!   1. codec version as 2-byte little-endian
//!   2. canonical JSON of the payload: fixed field order (codec_version,
//!      tenant_id, sequence, timestamp_ms, actor, action, resource_type,
//!      resource_id, metadata); serde_json object keys serialize sorted,
//!      so metadata insertion order never leaks into the bytes
//!
//! `entry_hash` input layout (bytes, in order):
//!   1. previous_hash as UTF-8 bytes (64 ASCII hex chars)
//!   2. payload_hash as UTF-8 bytes
//!   3. sequence as 8-byte little-endian
//!   4. tenant_id as UTF-8 bytes
//!
//! Timestamps canonicalize as epoch milliseconds — a fixed unit with no
//! locale- or timezone-dependent formatting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use custodia_contracts::{
    entry::{AuditEntry, AuditEvent, TenantId},
    error::{LedgerError, LedgerResult},
};

/// The canonicalization rules this codec currently writes.
///
/// The version tag is part of the hashed bytes: if the event schema ever
/// changes, a new version is introduced and historical entries continue to
/// verify under the rules in force when they were written.
pub const CODEC_VERSION: u16 = 1;

/// The fixed-order payload document fed into the payload hash.
#[derive(Serialize)]
struct CanonicalPayload<'a> {
    codec_version: u16,
    tenant_id: &'a str,
    sequence: u64,
    timestamp_ms: i64,
    actor: &'a str,
    action: &'a str,
    resource_type: &'a str,
    resource_id: &'a str,
    metadata: &'a serde_json::Map<String, serde_json::Value>,
}

/// Reject events the codec cannot canonicalize.
///
/// Runs before any hash is computed or state mutated: a rejected event
/// leaves the ledger untouched. Required string fields must be non-empty;
/// metadata values are limited to null, booleans, integers, strings, and
/// arrays/objects of the same. Floats are rejected — there is no canonical
/// textual form for them that survives round-tripping.
pub fn validate_event(tenant_id: &TenantId, event: &AuditEvent) -> LedgerResult<()> {
    let required = [
        ("tenant_id", tenant_id.as_str()),
        ("actor", event.actor.as_str()),
        ("action", event.action.as_str()),
        ("resource_type", event.resource_type.as_str()),
        ("resource_id", event.resource_id.as_str()),
    ];
    for (name, value) in required {
        if value.is_empty() {
            return Err(LedgerError::Validation {
                reason: format!("required field '{name}' must not be empty"),
            });
        }
    }

    for (key, value) in &event.metadata {
        validate_value(key, value)?;
    }
    Ok(())
}

fn validate_value(path: &str, value: &serde_json::Value) -> LedgerResult<()> {
    match value {
        serde_json::Value::Null
        | serde_json::Value::Bool(_)
        | serde_json::Value::String(_) => Ok(()),
        serde_json::Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(())
            } else {
                Err(LedgerError::Validation {
                    reason: format!(
                        "metadata value at '{path}' is a non-integer number; \
                         floats have no canonical form and are not supported"
                    ),
                })
            }
        }
        serde_json::Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                validate_value(&format!("{path}[{idx}]"), item)?;
            }
            Ok(())
        }
        serde_json::Value::Object(map) => {
            for (key, item) in map {
                validate_value(&format!("{path}.{key}"), item)?;
            }
            Ok(())
        }
    }
}

/// Produce the canonical bytes for an event at a given chain position.
///
/// Fails with `Validation` (and computes no hash) if the event is outside
/// the supported schema.
pub fn canonical_bytes(
    tenant_id: &TenantId,
    sequence: u64,
    timestamp: DateTime<Utc>,
    event: &AuditEvent,
) -> LedgerResult<Vec<u8>> {
    validate_event(tenant_id, event)?;
    encode_v1(
        tenant_id,
        sequence,
        timestamp,
        &event.actor,
        &event.action,
        &event.resource_type,
        &event.resource_id,
        &event.metadata,
    )
}

#[allow(clippy::too_many_arguments)]
fn encode_v1(
    tenant_id: &TenantId,
    sequence: u64,
    timestamp: DateTime<Utc>,
    actor: &str,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    metadata: &serde_json::Map<String, serde_json::Value>,
) -> LedgerResult<Vec<u8>> {
    let payload = CanonicalPayload {
        codec_version: 1,
        tenant_id: tenant_id.as_str(),
        sequence,
        timestamp_ms: timestamp.timestamp_millis(),
        actor,
        action,
        resource_type,
        resource_id,
        metadata,
    };

    // serde_json::to_vec produces deterministic JSON: fixed struct field
    // order, sorted object keys, no incidental whitespace.
    let json = serde_json::to_vec(&payload).map_err(|e| LedgerError::Validation {
        reason: format!("canonicalization failed: {e}"),
    })?;

    let mut bytes = Vec::with_capacity(2 + json.len());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&json);
    Ok(bytes)
}

/// Compute the payload hash for an event at a given chain position.
///
/// Returns a lowercase 64-character hex string.
pub fn payload_hash(
    tenant_id: &TenantId,
    sequence: u64,
    timestamp: DateTime<Utc>,
    event: &AuditEvent,
) -> LedgerResult<String> {
    let bytes = canonical_bytes(tenant_id, sequence, timestamp, event)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Recompute a stored entry's payload hash under the codec version it was
/// written with.
///
/// The verifier uses this to rederive hashes from scratch; an entry tagged
/// with a codec version this build does not know cannot be re-verified.
pub fn payload_hash_for_entry(entry: &AuditEntry) -> LedgerResult<String> {
    match entry.codec_version {
        1 => {
            let bytes = encode_v1(
                &entry.tenant_id,
                entry.sequence,
                entry.timestamp,
                &entry.actor,
                &entry.action,
                &entry.resource_type,
                &entry.resource_id,
                &entry.metadata,
            )?;
            Ok(hex::encode(Sha256::digest(&bytes)))
        }
        version => Err(LedgerError::Validation {
            reason: format!(
                "entry at sequence {} carries unknown codec version {version}",
                entry.sequence
            ),
        }),
    }
}

/// Compute the hash that binds an entry to its payload and predecessor.
///
/// This is what the next entry's `previous_hash` links to. Returns a
/// lowercase 64-character hex string.
pub fn entry_hash(
    previous_hash: &str,
    payload_hash: &str,
    sequence: u64,
    tenant_id: &TenantId,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(payload_hash.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(tenant_id.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
