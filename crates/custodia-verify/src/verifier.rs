//! Chain verification: recompute everything, trust nothing.
//!
//! The verifier walks a range in ascending sequence order, maintaining a
//! running expected-previous-hash. For every entry it checks, in order:
//!
//! 1. **Continuity** — the sequence is exactly one more than the previous
//!    entry's (gapless).
//! 2. **Tenant scope** — the entry belongs to the chain being verified.
//! 3. **Prev-hash linkage** — the stored `previous_hash` equals the
//!    predecessor's `entry_hash` (or the anchor for the first entry).
//! 4. **Payload correctness** — `payload_hash` matches a recomputation
//!    from the entry's canonicalized content.
//! 5. **Entry-hash correctness** — `entry_hash` matches a recomputation
//!    from the entry's own fields.
//!
//! A single break invalidates everything after it, so fail-fast stops at
//! the first fault. Full-scan mode keeps walking purely for diagnostics.
//! Verification mutates nothing and is cancellable at any entry boundary.

use std::sync::Arc;

use tracing::{debug, info, warn};

use custodia_codec as codec;
use custodia_contracts::{
    entry::{AuditEntry, TenantId},
    error::{LedgerError, LedgerResult},
    report::{ChainFault, VerificationReport},
};
use custodia_core::traits::ChainStore;

/// How much of a broken range to examine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyMode {
    /// Stop at the first fault. The ledger's trust state is already
    /// decided there; further detail is immaterial.
    #[default]
    FailFast,

    /// Keep walking past faults and collect all of them, for diagnostic
    /// reporting only. Resyncs on the stored values after each fault.
    FullScan,
}

/// Verify a slice of entries against an anchor hash, standalone.
///
/// `entries` must be in ascending sequence order and is expected to cover
/// `[from, to]`; anything missing from that window is reported as a gap.
/// `anchor_hash` is the trusted `entry_hash` of the entry immediately
/// before the range — `GENESIS_HASH` when `from == 1`.
///
/// This is the shared core of both store-backed verification and
/// standalone segment import; it touches no storage.
pub fn verify_entries(
    tenant: &TenantId,
    entries: &[AuditEntry],
    anchor_hash: &str,
    from: u64,
    to: u64,
    mode: VerifyMode,
) -> VerificationReport {
    if to < from {
        return VerificationReport::empty_pass();
    }

    let mut faults: Vec<ChainFault> = Vec::new();
    let mut expected_sequence = from;
    let mut expected_previous = anchor_hash.to_string();

    for entry in entries {
        let fault = check_entry(tenant, entry, expected_sequence, &expected_previous);

        match fault {
            Some(fault) => {
                debug!(tenant = %tenant, fault = %fault, "chain fault detected");
                faults.push(fault);
                if mode == VerifyMode::FailFast {
                    break;
                }
                // Resync on the stored values so later faults are still
                // attributable to the entries that carry them.
                expected_sequence = entry.sequence + 1;
                expected_previous = entry.entry_hash.clone();
            }
            None => {
                expected_sequence += 1;
                expected_previous = entry.entry_hash.clone();
            }
        }
    }

    // Entries ran out before the requested range did: a trailing gap.
    if faults.is_empty() && expected_sequence <= to {
        faults.push(ChainFault::SequenceGap {
            expected: expected_sequence,
            found: 0,
        });
    }

    if faults.is_empty() {
        VerificationReport::pass(from, to, expected_previous)
    } else {
        VerificationReport::fail(from, to, faults)
    }
}

/// Run every check for one entry; `None` means it passed all of them.
fn check_entry(
    tenant: &TenantId,
    entry: &AuditEntry,
    expected_sequence: u64,
    expected_previous: &str,
) -> Option<ChainFault> {
    if entry.sequence != expected_sequence {
        return Some(ChainFault::SequenceGap {
            expected: expected_sequence,
            found: entry.sequence,
        });
    }
    if entry.tenant_id != *tenant {
        return Some(ChainFault::TenantMismatch {
            sequence: entry.sequence,
        });
    }
    if entry.previous_hash != expected_previous {
        return Some(ChainFault::PreviousHashMismatch {
            sequence: entry.sequence,
        });
    }

    // An entry whose payload cannot be recanonicalized (unknown codec
    // version, out-of-schema value) cannot be proven intact either way;
    // it fails the payload check.
    match codec::payload_hash_for_entry(entry) {
        Ok(recomputed) if recomputed == entry.payload_hash => {}
        _ => {
            return Some(ChainFault::PayloadHashMismatch {
                sequence: entry.sequence,
            })
        }
    }

    let recomputed = codec::entry_hash(
        &entry.previous_hash,
        &entry.payload_hash,
        entry.sequence,
        tenant,
    );
    if recomputed != entry.entry_hash {
        return Some(ChainFault::EntryHashMismatch {
            sequence: entry.sequence,
        });
    }

    None
}

/// Store-backed range verification. Read-only; may run concurrently with
/// appends and other verifiers without restriction.
pub struct ChainVerifier {
    store: Arc<dyn ChainStore>,
}

impl ChainVerifier {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self { store }
    }

    /// Verify `[from, to]` fail-fast, anchored at genesis or the stored
    /// predecessor.
    pub fn verify(&self, tenant: &TenantId, from: u64, to: u64) -> LedgerResult<VerificationReport> {
        self.verify_with(tenant, from, to, None, VerifyMode::FailFast)
    }

    /// Verify the tenant's entire chain. An empty chain passes trivially.
    pub fn verify_all(&self, tenant: &TenantId) -> LedgerResult<VerificationReport> {
        let last = self.store.tail(tenant)?.last_sequence;
        if last == 0 {
            return Ok(VerificationReport::empty_pass());
        }
        self.verify(tenant, 1, last)
    }

    /// Verify `[from, to]` with full control over anchoring and scan mode.
    ///
    /// `trusted_prior` is a checkpoint hash the caller obtained from an
    /// earlier passing report; supplying it makes incremental
    /// re-verification independent of the stored predecessor. When absent
    /// and `from > 1`, the anchor is read from the store.
    ///
    /// # Errors
    ///
    /// `InvalidRange` when the range lies outside the chain's actual
    /// bounds — an input error, not a verification failure. An empty range
    /// (`to < from`) passes trivially instead.
    pub fn verify_with(
        &self,
        tenant: &TenantId,
        from: u64,
        to: u64,
        trusted_prior: Option<&str>,
        mode: VerifyMode,
    ) -> LedgerResult<VerificationReport> {
        if to < from {
            return Ok(VerificationReport::empty_pass());
        }

        let length = self.store.tail(tenant)?.last_sequence;
        if from == 0 || to > length {
            return Err(LedgerError::InvalidRange { from, to, length });
        }

        let anchor = if from == 1 {
            AuditEntry::GENESIS_HASH.to_string()
        } else if let Some(prior) = trusted_prior {
            prior.to_string()
        } else {
            match self.store.entry(tenant, from - 1)? {
                Some(prior) => prior.entry_hash,
                None => {
                    // Within bounds but absent: the anchor itself is lost.
                    return Err(LedgerError::Integrity {
                        tenant: tenant.to_string(),
                        reason: format!("anchor entry {} is missing from the store", from - 1),
                    });
                }
            }
        };

        let entries = self.store.read_range(tenant, from, to)?;
        let report = verify_entries(tenant, &entries, &anchor, from, to, mode);

        if report.valid {
            info!(
                tenant = %tenant,
                from,
                to,
                checkpoint = report.checkpoint_hash.as_deref().unwrap_or(""),
                "chain range verified"
            );
        } else {
            warn!(
                tenant = %tenant,
                from,
                to,
                first_invalid = report.first_invalid_sequence.unwrap_or(0),
                reason = %report.reason.as_ref().map(ToString::to_string).unwrap_or_default(),
                "chain range FAILED verification"
            );
        }

        Ok(report)
    }
}
