//! The storage contract for tenant chains.
//!
//! `ChainStore` is the seam between the ledger's semantic integrity
//! discipline and whatever durable store backs it. The store owns physical
//! persistence and crash-consistent writes; the ledger owns the chaining
//! and verification rules layered on top.
//!
//! Implementations must guarantee:
//!
//! - `commit` is atomic: the entry row and the tail advance land together
//!   or not at all. A reader never observes a dangling tail or a partial
//!   entry, and never sees sequence `N+1` without `N`.
//! - Tenants are isolated: operations on one tenant never block writers of
//!   another (no global write lock across tenants).
//! - Quarantined ranges are retained forever, readable through
//!   `quarantine_records` but excluded from `entry` and `read_range`.

use custodia_contracts::{
    entry::{AuditEntry, ChainTail, TenantId},
    error::LedgerResult,
    recovery::QuarantineRecord,
    report::ChainFault,
};

/// Result of an optimistic commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The entry was persisted and the tail advanced to the returned value.
    Committed(ChainTail),

    /// Another append won the race: the stored tail version no longer
    /// matches the one observed at read time. Nothing was written; the
    /// caller re-reads the tail and retries.
    Conflict {
        /// The tail as stored at the time of the refused commit.
        current: ChainTail,
    },
}

/// Durable, tenant-scoped, append-only entry storage.
pub trait ChainStore: Send + Sync {
    /// Read the tenant's current tail record.
    ///
    /// A tenant with no entries yet reports the genesis tail
    /// (`last_sequence = 0`, `last_entry_hash = GENESIS_HASH`).
    fn tail(&self, tenant: &TenantId) -> LedgerResult<ChainTail>;

    /// Atomically persist `entry` and advance the tail, if and only if the
    /// stored tail version still equals `expected_version`.
    ///
    /// Refuses with `LedgerError::Integrity` when the chain is quarantined
    /// and awaiting an explicit resume.
    fn commit(&self, entry: AuditEntry, expected_version: u64) -> LedgerResult<CommitOutcome>;

    /// Read a single active entry by sequence, if present.
    fn entry(&self, tenant: &TenantId, sequence: u64) -> LedgerResult<Option<AuditEntry>>;

    /// Read active entries with `from <= sequence <= to`, ascending.
    ///
    /// Returns exactly the entries that exist in that window; the verifier
    /// is responsible for interpreting anything missing as a gap.
    fn read_range(&self, tenant: &TenantId, from: u64, to: u64) -> LedgerResult<Vec<AuditEntry>>;

    /// Move `[from_sequence, tail]` into the tenant's quarantine area,
    /// rewind the tail to `from_sequence - 1`, and halt the chain until
    /// `resume_from` is called.
    ///
    /// The quarantined entries are preserved verbatim in the returned
    /// record and are never deleted.
    fn quarantine_range(
        &self,
        tenant: &TenantId,
        from_sequence: u64,
        fault: ChainFault,
    ) -> LedgerResult<QuarantineRecord>;

    /// All quarantine records for the tenant, oldest first.
    fn quarantine_records(&self, tenant: &TenantId) -> LedgerResult<Vec<QuarantineRecord>>;

    /// Reopen a halted chain for appending from the documented fork point.
    ///
    /// `last_good_sequence` must equal the rewound tail's sequence; the
    /// mismatch case is rejected rather than guessed at.
    fn resume_from(&self, tenant: &TenantId, last_good_sequence: u64) -> LedgerResult<ChainTail>;
}
