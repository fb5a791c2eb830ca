//! # custodia-verify
//!
//! Hash-chain verification for the Custodia ledger.
//!
//! [`verifier::ChainVerifier`] proves (or disproves) the integrity of a
//! stored range by rederiving every hash from scratch, without trusting
//! the storage layer. The standalone [`verifier::verify_entries`] walks a
//! slice of entries against a trusted anchor and is shared with segment
//! import.

pub mod verifier;

pub use verifier::{verify_entries, ChainVerifier, VerifyMode};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use custodia_contracts::{AuditEvent, ChainFault, LedgerError, TenantId};
    use custodia_core::{ChainAppender, ChainStore, LedgerConfig, MemoryChainStore};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn tenant() -> TenantId {
        TenantId::new("acme")
    }

    fn make_event(label: &str) -> AuditEvent {
        AuditEvent::new("alice", "data.read", "patient_record", "pr-42")
            .with_metadata("label", json!(label))
    }

    /// Store with `n` entries appended for tenant "acme".
    fn populated(n: usize) -> (Arc<MemoryChainStore>, ChainVerifier) {
        let store = Arc::new(MemoryChainStore::new());
        let appender = ChainAppender::with_config(
            store.clone(),
            LedgerConfig {
                max_append_attempts: 5,
                retry_backoff_ms: 0,
            },
        );
        for i in 0..n {
            appender.append(&tenant(), &make_event(&format!("event-{i}"))).unwrap();
        }
        let verifier = ChainVerifier::new(store.clone());
        (store, verifier)
    }

    // ── Passing verification ──────────────────────────────────────────────────

    /// A freshly appended chain verifies end to end, and the checkpoint is
    /// the final entry's hash.
    #[test]
    fn untouched_chain_verifies() {
        let (store, verifier) = populated(5);
        let report = verifier.verify(&tenant(), 1, 5).unwrap();

        assert!(report.valid);
        assert_eq!(report.checked_range, Some((1, 5)));

        let last = store.entry(&tenant(), 5).unwrap().unwrap();
        assert_eq!(report.checkpoint_hash.as_deref(), Some(last.entry_hash.as_str()));
    }

    #[test]
    fn empty_chain_verifies_trivially() {
        let (_, verifier) = populated(0);
        let report = verifier.verify_all(&tenant()).unwrap();
        assert!(report.valid);
        assert!(report.checked_range.is_none());
    }

    #[test]
    fn empty_range_verifies_trivially() {
        let (_, verifier) = populated(3);
        let report = verifier.verify(&tenant(), 3, 2).unwrap();
        assert!(report.valid);
        assert!(report.checked_range.is_none());
    }

    /// A checkpoint from an earlier pass anchors incremental
    /// re-verification of the remainder.
    #[test]
    fn checkpoint_anchors_incremental_verification() {
        let (_, verifier) = populated(6);

        let first = verifier.verify(&tenant(), 1, 3).unwrap();
        assert!(first.valid);
        let checkpoint = first.checkpoint_hash.unwrap();

        let rest = verifier
            .verify_with(&tenant(), 4, 6, Some(&checkpoint), VerifyMode::FailFast)
            .unwrap();
        assert!(rest.valid);
    }

    /// Without a caller-supplied checkpoint, a mid-chain range anchors at
    /// the stored predecessor.
    #[test]
    fn mid_range_anchors_at_stored_predecessor() {
        let (_, verifier) = populated(6);
        let report = verifier.verify(&tenant(), 4, 6).unwrap();
        assert!(report.valid);
    }

    // ── Range bounds ──────────────────────────────────────────────────────────

    /// Asking past the tail is an input error, not a verification failure.
    #[test]
    fn range_beyond_chain_is_an_input_error() {
        let (_, verifier) = populated(3);
        let err = verifier.verify(&tenant(), 1, 10).unwrap_err();
        match err {
            LedgerError::InvalidRange { from, to, length } => {
                assert_eq!((from, to, length), (1, 10, 3));
            }
            other => panic!("expected InvalidRange, got {other:?}"),
        }
    }

    #[test]
    fn sequence_zero_is_an_input_error() {
        let (_, verifier) = populated(3);
        let err = verifier.verify(&tenant(), 0, 2).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRange { .. }));
    }

    // ── Tamper detection ──────────────────────────────────────────────────────

    /// Append A, B, C; flip one metadata field in B's stored record; the
    /// chain fails at exactly sequence 2 with a payload-hash mismatch,
    /// never before it.
    #[test]
    fn flipped_metadata_fails_at_that_entry() {
        let (store, verifier) = populated(3);

        store
            .tamper_entry(&tenant(), 2, |e| {
                e.metadata.insert("label".to_string(), json!("FLIPPED"));
            })
            .unwrap();

        let report = verifier.verify(&tenant(), 1, 3).unwrap();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_sequence, Some(2));
        assert_eq!(
            report.reason,
            Some(ChainFault::PayloadHashMismatch { sequence: 2 })
        );
    }

    /// Corrupting a stored previous_hash is caught as a broken link.
    #[test]
    fn corrupted_link_fails_at_that_entry() {
        let (store, verifier) = populated(4);

        store
            .tamper_entry(&tenant(), 3, |e| {
                e.previous_hash = "ff".repeat(32);
            })
            .unwrap();

        let report = verifier.verify(&tenant(), 1, 4).unwrap();
        assert_eq!(report.first_invalid_sequence, Some(3));
        assert_eq!(
            report.reason,
            Some(ChainFault::PreviousHashMismatch { sequence: 3 })
        );
    }

    /// Corrupting a stored entry_hash is caught by recomputation.
    #[test]
    fn corrupted_entry_hash_fails_at_that_entry() {
        let (store, verifier) = populated(3);

        store
            .tamper_entry(&tenant(), 3, |e| {
                e.entry_hash = "ab".repeat(32);
            })
            .unwrap();

        let report = verifier.verify(&tenant(), 1, 3).unwrap();
        assert_eq!(report.first_invalid_sequence, Some(3));
        assert_eq!(
            report.reason,
            Some(ChainFault::EntryHashMismatch { sequence: 3 })
        );
    }

    /// Deleting a mid-chain entry reports a gap at the deleted sequence.
    #[test]
    fn deleted_entry_reports_a_gap() {
        let (store, verifier) = populated(5);

        assert!(store.remove_entry(&tenant(), 3).unwrap());

        let report = verifier.verify(&tenant(), 1, 5).unwrap();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_sequence, Some(3));
        assert_eq!(
            report.reason,
            Some(ChainFault::SequenceGap { expected: 3, found: 4 })
        );
    }

    /// Deleting the final entry of the range is a trailing gap.
    #[test]
    fn deleted_tail_entry_reports_a_trailing_gap() {
        let (store, verifier) = populated(4);

        assert!(store.remove_entry(&tenant(), 4).unwrap());

        let report = verifier.verify(&tenant(), 1, 4).unwrap();
        assert_eq!(
            report.reason,
            Some(ChainFault::SequenceGap { expected: 4, found: 0 })
        );
    }

    /// An entry spliced in from another tenant's chain is rejected even if
    /// internally self-consistent.
    #[test]
    fn spliced_foreign_entry_is_rejected() {
        let (store, verifier) = populated(2);

        // Build a perfectly valid chain for a different tenant.
        let other = TenantId::new("globex");
        let appender = ChainAppender::with_config(
            store.clone(),
            LedgerConfig {
                max_append_attempts: 5,
                retry_backoff_ms: 0,
            },
        );
        appender.append(&other, &make_event("foreign")).unwrap();
        let foreign = store.entry(&other, 1).unwrap().unwrap();

        // Swap it in at acme's genesis position.
        store
            .tamper_entry(&tenant(), 1, |e| *e = foreign.clone())
            .unwrap();

        let report = verifier.verify(&tenant(), 1, 2).unwrap();
        assert_eq!(report.first_invalid_sequence, Some(1));
        assert_eq!(report.reason, Some(ChainFault::TenantMismatch { sequence: 1 }));
    }

    // ── Scan modes ────────────────────────────────────────────────────────────

    /// Fail-fast stops at the first break; everything after is untrusted
    /// by definition.
    #[test]
    fn fail_fast_reports_exactly_one_fault() {
        let (store, verifier) = populated(5);
        for seq in [2, 4] {
            store
                .tamper_entry(&tenant(), seq, |e| {
                    e.metadata.insert("label".to_string(), json!("X"));
                })
                .unwrap();
        }

        let report = verifier.verify(&tenant(), 1, 5).unwrap();
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.first_invalid_sequence, Some(2));
    }

    /// Full-scan keeps walking and attributes each fault to the entry that
    /// carries it.
    #[test]
    fn full_scan_collects_every_fault() {
        let (store, verifier) = populated(5);
        for seq in [2, 4] {
            store
                .tamper_entry(&tenant(), seq, |e| {
                    e.metadata.insert("label".to_string(), json!("X"));
                })
                .unwrap();
        }

        let report = verifier
            .verify_with(&tenant(), 1, 5, None, VerifyMode::FullScan)
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.first_invalid_sequence, Some(2), "first fault still leads");
        assert_eq!(
            report.faults,
            vec![
                ChainFault::PayloadHashMismatch { sequence: 2 },
                ChainFault::PayloadHashMismatch { sequence: 4 },
            ]
        );
    }

    // ── Quarantine interaction ────────────────────────────────────────────────

    /// After quarantine rewinds the tail, the surviving prefix verifies
    /// clean and the suspect range is out of bounds for verification.
    #[test]
    fn quarantined_range_is_excluded_from_verification() {
        let (store, verifier) = populated(4);
        store
            .tamper_entry(&tenant(), 3, |e| {
                e.metadata.insert("label".to_string(), json!("X"));
            })
            .unwrap();

        let failed = verifier.verify(&tenant(), 1, 4).unwrap();
        custodia_core::RecoveryCoordinator::new(store.clone())
            .quarantine(&tenant(), &failed)
            .unwrap();

        let report = verifier.verify_all(&tenant()).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked_range, Some((1, 2)));

        assert!(matches!(
            verifier.verify(&tenant(), 1, 4).unwrap_err(),
            LedgerError::InvalidRange { length: 2, .. }
        ));
    }
}
