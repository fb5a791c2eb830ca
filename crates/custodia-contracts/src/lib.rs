//! # custodia-contracts
//!
//! Shared types and error taxonomy for the Custodia audit ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod entry;
pub mod error;
pub mod recovery;
pub mod report;
pub mod segment;

pub use entry::{AuditEntry, AuditEvent, ChainTail, TenantId};
pub use error::{LedgerError, LedgerResult};
pub use recovery::QuarantineRecord;
pub use report::{ChainFault, SegmentReport, VerificationReport};
pub use segment::ChainSegment;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── ChainTail ────────────────────────────────────────────────────────────

    #[test]
    fn genesis_tail_links_to_genesis_hash() {
        let tail = ChainTail::genesis();
        assert_eq!(tail.last_sequence, 0);
        assert_eq!(tail.last_entry_hash, AuditEntry::GENESIS_HASH);
        assert_eq!(tail.version, 0);
    }

    #[test]
    fn genesis_hash_is_64_hex_zeros() {
        assert_eq!(AuditEntry::GENESIS_HASH.len(), 64);
        assert!(AuditEntry::GENESIS_HASH.chars().all(|c| c == '0'));
    }

    // ── AuditEvent builder ───────────────────────────────────────────────────

    #[test]
    fn event_builder_attaches_metadata() {
        let event = AuditEvent::new("alice", "data.read", "patient_record", "pr-42")
            .with_metadata("fields", json!(["name", "dob"]))
            .with_metadata("purpose", json!("treatment"));

        assert_eq!(event.actor, "alice");
        assert_eq!(event.metadata.len(), 2);
        assert_eq!(event.metadata["purpose"], json!("treatment"));
    }

    // ── ChainFault ───────────────────────────────────────────────────────────

    #[test]
    fn gap_fault_reports_the_missing_sequence() {
        let fault = ChainFault::SequenceGap {
            expected: 4,
            found: 5,
        };
        // The missing sequence is the invalid one, not the entry found there.
        assert_eq!(fault.sequence(), 4);
    }

    #[test]
    fn fault_display_names_the_sequence() {
        let fault = ChainFault::PayloadHashMismatch { sequence: 2 };
        let msg = fault.to_string();
        assert!(msg.contains("payload_hash mismatch"));
        assert!(msg.contains('2'));
    }

    // ── VerificationReport constructors ──────────────────────────────────────

    #[test]
    fn pass_report_carries_checkpoint() {
        let report = VerificationReport::pass(1, 3, "abc123");
        assert!(report.valid);
        assert_eq!(report.checked_range, Some((1, 3)));
        assert_eq!(report.checkpoint_hash.as_deref(), Some("abc123"));
        assert!(report.first_invalid_sequence.is_none());
        assert!(report.faults.is_empty());
    }

    #[test]
    fn empty_pass_checks_nothing() {
        let report = VerificationReport::empty_pass();
        assert!(report.valid);
        assert!(report.checked_range.is_none());
        assert!(report.checkpoint_hash.is_none());
    }

    #[test]
    fn fail_report_pinpoints_first_fault() {
        let report = VerificationReport::fail(
            1,
            5,
            vec![
                ChainFault::PayloadHashMismatch { sequence: 2 },
                ChainFault::PreviousHashMismatch { sequence: 3 },
            ],
        );
        assert!(!report.valid);
        assert_eq!(report.first_invalid_sequence, Some(2));
        assert_eq!(
            report.reason,
            Some(ChainFault::PayloadHashMismatch { sequence: 2 })
        );
        assert!(report.checkpoint_hash.is_none());
        assert_eq!(report.faults.len(), 2);
    }

    #[test]
    fn segment_report_requires_both_checks() {
        let chain_ok = VerificationReport::pass(1, 2, "h");
        let chain_bad =
            VerificationReport::fail(1, 2, vec![ChainFault::EntryHashMismatch { sequence: 1 }]);

        assert!(SegmentReport {
            chain: chain_ok.clone(),
            signature_valid: true
        }
        .is_valid());
        assert!(!SegmentReport {
            chain: chain_ok,
            signature_valid: false
        }
        .is_valid());
        assert!(!SegmentReport {
            chain: chain_bad,
            signature_valid: true
        }
        .is_valid());
    }

    // ── Serde round-trips ────────────────────────────────────────────────────

    #[test]
    fn verification_report_round_trips() {
        let original =
            VerificationReport::fail(1, 9, vec![ChainFault::SequenceGap { expected: 4, found: 6 }]);
        let json = serde_json::to_string(&original).unwrap();
        let decoded: VerificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    // ── LedgerError display messages ─────────────────────────────────────────

    #[test]
    fn error_validation_display() {
        let err = LedgerError::Validation {
            reason: "actor must not be empty".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("validation failed"));
        assert!(msg.contains("actor must not be empty"));
    }

    #[test]
    fn error_contention_display() {
        let err = LedgerError::Contention {
            tenant: "acme".to_string(),
            attempts: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("acme"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn error_invalid_range_display() {
        let err = LedgerError::InvalidRange {
            from: 1,
            to: 10,
            length: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("[1, 10]"));
        assert!(msg.contains("length 3"));
    }

    #[test]
    fn error_integrity_display() {
        let err = LedgerError::Integrity {
            tenant: "acme".to_string(),
            reason: "payload_hash mismatch at sequence 2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("integrity violation"));
        assert!(msg.contains("sequence 2"));
    }
}
