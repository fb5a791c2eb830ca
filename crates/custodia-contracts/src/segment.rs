//! The portable export artifact.
//!
//! A `ChainSegment` is a signed, self-contained export of a contiguous
//! chain range, produced for evidence packages and external auditors. It
//! carries everything needed to re-verify the range without access to the
//! originating store: the raw entries, the codec version, and an ed25519
//! signature over the entry hashes and segment metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entry::{AuditEntry, TenantId},
    error::{LedgerError, LedgerResult},
};

/// A signed, contiguous run of entries from one tenant's chain.
///
/// Never mutated once produced. The signing key is held only by the
/// exporting system; key custody and rotation live outside the ledger core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSegment {
    /// Unique artifact identifier.
    pub segment_id: Uuid,

    /// The chain this segment was cut from.
    pub tenant_id: TenantId,

    /// First sequence in the segment (inclusive).
    pub from_sequence: u64,

    /// Last sequence in the segment (inclusive).
    pub to_sequence: u64,

    /// When the segment was produced (UTC).
    pub exported_at: DateTime<Utc>,

    /// Identity of the exporting system, for the evidence trail.
    pub exporter: String,

    /// Codec version in force when the segment was produced. The artifact
    /// is self-describing: an importer needs nothing else to re-verify.
    pub codec_version: u16,

    /// The raw entries, in ascending sequence order.
    pub entries: Vec<AuditEntry>,

    /// Hex-encoded ed25519 signature over the segment's signing bytes.
    pub signature: String,
}

impl ChainSegment {
    /// Serialize the segment to its portable JSON form.
    pub fn to_json(&self) -> LedgerResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Validation {
            reason: format!("segment serialization failed: {e}"),
        })
    }

    /// Parse a segment from its portable JSON form.
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Validation {
            reason: format!("malformed segment artifact: {e}"),
        })
    }
}
