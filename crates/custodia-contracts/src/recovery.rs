//! Quarantine record types.
//!
//! When verification finds a break at sequence `S`, the range `[S, tail]`
//! is moved into the tenant's quarantine area: readable for forensic
//! inspection, excluded from verification and export, and never deleted —
//! the quarantined range is itself evidence of the tampering event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    entry::{AuditEntry, TenantId},
    report::ChainFault,
};

/// Forensic record of one quarantined chain range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    /// The chain the range was cut out of.
    pub tenant_id: TenantId,

    /// First quarantined sequence (the first broken link).
    pub from_sequence: u64,

    /// Last quarantined sequence (the chain tail at quarantine time).
    pub to_sequence: u64,

    /// When the quarantine was applied (UTC).
    pub quarantined_at: DateTime<Utc>,

    /// The fault that triggered the quarantine.
    pub fault: ChainFault,

    /// The suspect entries exactly as stored, preserved for forensics.
    pub entries: Vec<AuditEntry>,
}
