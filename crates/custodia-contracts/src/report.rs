//! Verification result types.
//!
//! A `VerificationReport` is created fresh per verification run and is not
//! part of the chain itself. On failure it pinpoints the first broken link;
//! everything after that point is untrusted by definition, so fail-fast
//! verification stops there. Full-scan mode keeps walking purely for
//! diagnostic reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One specific way a chain entry can fail verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainFault {
    /// The entry's sequence is not exactly one more than its predecessor's.
    ///
    /// `found` is 0 (never a valid sequence) when no entry was present at
    /// all where one was expected.
    SequenceGap { expected: u64, found: u64 },

    /// The entry's stored `previous_hash` does not equal the predecessor's
    /// `entry_hash`.
    PreviousHashMismatch { sequence: u64 },

    /// Recomputing the payload hash from the entry's canonicalized content
    /// does not reproduce the stored `payload_hash`.
    PayloadHashMismatch { sequence: u64 },

    /// Recomputing `entry_hash` from the entry's own fields does not
    /// reproduce the stored value.
    EntryHashMismatch { sequence: u64 },

    /// The entry belongs to a different tenant's chain.
    TenantMismatch { sequence: u64 },
}

impl ChainFault {
    /// The sequence at which this fault invalidates the chain.
    ///
    /// For a gap this is the expected (missing) sequence, not the sequence
    /// of the entry found in its place.
    pub fn sequence(&self) -> u64 {
        match self {
            ChainFault::SequenceGap { expected, .. } => *expected,
            ChainFault::PreviousHashMismatch { sequence }
            | ChainFault::PayloadHashMismatch { sequence }
            | ChainFault::EntryHashMismatch { sequence }
            | ChainFault::TenantMismatch { sequence } => *sequence,
        }
    }
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFault::SequenceGap { expected, found } => {
                write!(f, "sequence gap: expected {expected}, found {found}")
            }
            ChainFault::PreviousHashMismatch { sequence } => {
                write!(f, "previous_hash mismatch at sequence {sequence}")
            }
            ChainFault::PayloadHashMismatch { sequence } => {
                write!(f, "payload_hash mismatch at sequence {sequence}")
            }
            ChainFault::EntryHashMismatch { sequence } => {
                write!(f, "entry_hash mismatch at sequence {sequence}")
            }
            ChainFault::TenantMismatch { sequence } => {
                write!(f, "tenant mismatch at sequence {sequence}")
            }
        }
    }
}

/// The outcome of one verification run over a chain range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True when every entry in the range passed all checks.
    pub valid: bool,

    /// The `(from, to)` range actually checked; `None` for an empty range.
    pub checked_range: Option<(u64, u64)>,

    /// On failure, the sequence of the first broken link.
    pub first_invalid_sequence: Option<u64>,

    /// On failure, which check broke first.
    pub reason: Option<ChainFault>,

    /// On success, the final entry's `entry_hash`. Callers may cache this
    /// as a trusted anchor for cheaper incremental re-verification later.
    pub checkpoint_hash: Option<String>,

    /// Every fault observed. Fail-fast runs hold at most one; full-scan
    /// runs may hold more, purely for diagnostics.
    pub faults: Vec<ChainFault>,
}

impl VerificationReport {
    /// A passing report over `(from, to)` ending at `checkpoint_hash`.
    pub fn pass(from: u64, to: u64, checkpoint_hash: impl Into<String>) -> Self {
        Self {
            valid: true,
            checked_range: Some((from, to)),
            first_invalid_sequence: None,
            reason: None,
            checkpoint_hash: Some(checkpoint_hash.into()),
            faults: Vec::new(),
        }
    }

    /// The trivially-valid report for an empty range.
    pub fn empty_pass() -> Self {
        Self {
            valid: true,
            checked_range: None,
            first_invalid_sequence: None,
            reason: None,
            checkpoint_hash: None,
            faults: Vec::new(),
        }
    }

    /// A failing report over `(from, to)`.
    ///
    /// `faults` must be in chain order and non-empty; the first fault
    /// becomes `first_invalid_sequence` and `reason`.
    pub fn fail(from: u64, to: u64, faults: Vec<ChainFault>) -> Self {
        let first = faults.first().cloned();
        Self {
            valid: false,
            checked_range: Some((from, to)),
            first_invalid_sequence: first.as_ref().map(ChainFault::sequence),
            reason: first,
            checkpoint_hash: None,
            faults,
        }
    }
}

/// The result of standalone verification of an imported segment: the
/// internal chain-link check plus the artifact signature check. Both must
/// pass for the segment to count as valid evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    /// Chain-link verification of the segment's entries.
    pub chain: VerificationReport,

    /// Whether the segment signature verified against the exporter's key.
    pub signature_valid: bool,
}

impl SegmentReport {
    /// True only when the chain links and the signature both check out.
    pub fn is_valid(&self) -> bool {
        self.chain.valid && self.signature_valid
    }
}
