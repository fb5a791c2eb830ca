//! In-memory implementation of `ChainStore`.
//!
//! `MemoryChainStore` is the reference implementation of the storage
//! contract: one mutex per tenant chain (writers of different tenants
//! never contend), an outer `RwLock` only for tenant-map lookup, and a
//! version-checked commit that backs the optimistic append protocol the
//! same way a row-versioned tail record would in a relational store.
//!
//! It also exposes `tamper_entry` and `remove_entry`, which bypass the
//! integrity discipline entirely. They simulate out-of-band corruption of
//! the underlying storage and exist for integrity drills and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use tracing::warn;

use custodia_contracts::{
    entry::{AuditEntry, ChainTail, TenantId},
    error::{LedgerError, LedgerResult},
    recovery::QuarantineRecord,
    report::ChainFault,
};

use crate::traits::{ChainStore, CommitOutcome};

/// Mutable state of one tenant's chain.
struct TenantChain {
    /// Active entries in append order.
    entries: Vec<AuditEntry>,

    /// The tail record commits compare-and-swap on.
    tail: ChainTail,

    /// Set by quarantine; cleared only by an explicit resume.
    halted: bool,

    /// Quarantined ranges, oldest first. Never drained.
    quarantine: Vec<QuarantineRecord>,
}

impl TenantChain {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            tail: ChainTail::genesis(),
            halted: false,
            quarantine: Vec::new(),
        }
    }
}

/// An in-memory, per-tenant-locked chain store.
#[derive(Default)]
pub struct MemoryChainStore {
    chains: RwLock<HashMap<TenantId, Arc<Mutex<TenantChain>>>>,
}

impl MemoryChainStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or lazily create) the handle for a tenant's chain.
    fn chain(&self, tenant: &TenantId) -> LedgerResult<Arc<Mutex<TenantChain>>> {
        {
            let chains = self.chains.read().map_err(poisoned)?;
            if let Some(chain) = chains.get(tenant) {
                return Ok(Arc::clone(chain));
            }
        }
        let mut chains = self.chains.write().map_err(poisoned)?;
        Ok(Arc::clone(
            chains
                .entry(tenant.clone())
                .or_insert_with(|| Arc::new(Mutex::new(TenantChain::new()))),
        ))
    }

    /// Mutate one stored entry in place, bypassing all integrity checks.
    ///
    /// Simulates an attacker or fault corrupting the underlying store.
    /// Returns false when no active entry has the given sequence.
    pub fn tamper_entry(
        &self,
        tenant: &TenantId,
        sequence: u64,
        mutate: impl FnOnce(&mut AuditEntry),
    ) -> LedgerResult<bool> {
        let chain = self.chain(tenant)?;
        let mut chain = chain.lock().map_err(poisoned)?;
        match chain.entries.iter_mut().find(|e| e.sequence == sequence) {
            Some(entry) => {
                mutate(entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete one stored entry outright, bypassing all integrity checks.
    ///
    /// Simulates data loss or a deletion attack; the tail is deliberately
    /// left untouched so the hole is visible to the verifier as a gap.
    pub fn remove_entry(&self, tenant: &TenantId, sequence: u64) -> LedgerResult<bool> {
        let chain = self.chain(tenant)?;
        let mut chain = chain.lock().map_err(poisoned)?;
        let before = chain.entries.len();
        chain.entries.retain(|e| e.sequence != sequence);
        Ok(chain.entries.len() != before)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Durability {
        reason: "store lock poisoned".to_string(),
    }
}

impl ChainStore for MemoryChainStore {
    fn tail(&self, tenant: &TenantId) -> LedgerResult<ChainTail> {
        let chain = self.chain(tenant)?;
        let chain = chain.lock().map_err(poisoned)?;
        Ok(chain.tail.clone())
    }

    fn commit(&self, entry: AuditEntry, expected_version: u64) -> LedgerResult<CommitOutcome> {
        let chain = self.chain(&entry.tenant_id)?;
        let mut chain = chain.lock().map_err(poisoned)?;

        if chain.halted {
            return Err(LedgerError::Integrity {
                tenant: entry.tenant_id.to_string(),
                reason: "chain is quarantined and awaiting resume".to_string(),
            });
        }

        if chain.tail.version != expected_version {
            return Ok(CommitOutcome::Conflict {
                current: chain.tail.clone(),
            });
        }

        let tail = ChainTail {
            last_sequence: entry.sequence,
            last_entry_hash: entry.entry_hash.clone(),
            last_timestamp: entry.timestamp,
            version: expected_version + 1,
        };
        chain.entries.push(entry);
        chain.tail = tail.clone();
        Ok(CommitOutcome::Committed(tail))
    }

    fn entry(&self, tenant: &TenantId, sequence: u64) -> LedgerResult<Option<AuditEntry>> {
        let chain = self.chain(tenant)?;
        let chain = chain.lock().map_err(poisoned)?;
        Ok(chain
            .entries
            .iter()
            .find(|e| e.sequence == sequence)
            .cloned())
    }

    fn read_range(&self, tenant: &TenantId, from: u64, to: u64) -> LedgerResult<Vec<AuditEntry>> {
        let chain = self.chain(tenant)?;
        let chain = chain.lock().map_err(poisoned)?;
        Ok(chain
            .entries
            .iter()
            .filter(|e| e.sequence >= from && e.sequence <= to)
            .cloned()
            .collect())
    }

    fn quarantine_range(
        &self,
        tenant: &TenantId,
        from_sequence: u64,
        fault: ChainFault,
    ) -> LedgerResult<QuarantineRecord> {
        let chain = self.chain(tenant)?;
        let mut chain = chain.lock().map_err(poisoned)?;

        let to_sequence = chain.tail.last_sequence;
        if from_sequence == 0 || from_sequence > to_sequence {
            return Err(LedgerError::InvalidRange {
                from: from_sequence,
                to: to_sequence,
                length: to_sequence,
            });
        }

        let suspect: Vec<AuditEntry> = chain
            .entries
            .iter()
            .filter(|e| e.sequence >= from_sequence)
            .cloned()
            .collect();
        chain.entries.retain(|e| e.sequence < from_sequence);

        let record = QuarantineRecord {
            tenant_id: tenant.clone(),
            from_sequence,
            to_sequence,
            quarantined_at: Utc::now(),
            fault,
            entries: suspect,
        };

        // Rewind the tail to the last known-good entry. The version still
        // advances: a concurrent append that read the pre-quarantine tail
        // must not commit on top of the rewound chain.
        let (last_entry_hash, last_timestamp) = match chain.entries.last() {
            Some(e) => (e.entry_hash.clone(), e.timestamp),
            None => (
                AuditEntry::GENESIS_HASH.to_string(),
                chrono::DateTime::UNIX_EPOCH,
            ),
        };
        chain.tail = ChainTail {
            last_sequence: from_sequence - 1,
            last_entry_hash,
            last_timestamp,
            version: chain.tail.version + 1,
        };
        chain.halted = true;
        chain.quarantine.push(record.clone());

        warn!(
            tenant = %tenant,
            from = from_sequence,
            to = to_sequence,
            fault = %record.fault,
            "chain range quarantined; appends halted until resume"
        );

        Ok(record)
    }

    fn quarantine_records(&self, tenant: &TenantId) -> LedgerResult<Vec<QuarantineRecord>> {
        let chain = self.chain(tenant)?;
        let chain = chain.lock().map_err(poisoned)?;
        Ok(chain.quarantine.clone())
    }

    fn resume_from(&self, tenant: &TenantId, last_good_sequence: u64) -> LedgerResult<ChainTail> {
        let chain = self.chain(tenant)?;
        let mut chain = chain.lock().map_err(poisoned)?;

        if !chain.halted {
            return Err(LedgerError::Validation {
                reason: format!("chain for tenant '{tenant}' is not halted"),
            });
        }
        if chain.tail.last_sequence != last_good_sequence {
            return Err(LedgerError::Validation {
                reason: format!(
                    "fork point mismatch: last good sequence is {}, caller requested {}",
                    chain.tail.last_sequence, last_good_sequence
                ),
            });
        }

        chain.halted = false;
        Ok(chain.tail.clone())
    }
}
