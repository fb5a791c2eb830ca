//! Error taxonomy for the Custodia ledger.
//!
//! All fallible operations in the ledger return `LedgerResult<T>`. The
//! variants map one-to-one onto the recovery posture the caller must take:
//! validation and contention errors are retryable with corrected input or
//! backoff, durability errors mean the event must be treated as unrecorded,
//! and integrity errors are fatal to trust in the affected range and are
//! never auto-repaired.

use thiserror::Error;

/// The unified error type for the Custodia ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The event was rejected before any hash was computed or state changed.
    ///
    /// Always recoverable: the caller retries with corrected input.
    #[error("event validation failed: {reason}")]
    Validation { reason: String },

    /// The chain tail moved during an append and the bounded retry budget
    /// was exhausted. The event was NOT recorded.
    #[error("write contention on tenant '{tenant}' after {attempts} attempts")]
    Contention { tenant: String, attempts: u32 },

    /// The durable store was unreachable or did not acknowledge a write.
    ///
    /// The caller must treat the event as unrecorded; it may be re-submitted.
    #[error("durable store failure: {reason}")]
    Durability { reason: String },

    /// Verification found a broken link, gap, or refused operation on an
    /// untrusted range. Fatal to trust in the affected range; triggers
    /// quarantine rather than repair.
    #[error("chain integrity violation on tenant '{tenant}': {reason}")]
    Integrity { tenant: String, reason: String },

    /// A verification or export range lies outside the chain's actual
    /// bounds. This is an input error, not evidence of tampering.
    #[error("invalid range [{from}, {to}] for chain of length {length}")]
    InvalidRange { from: u64, to: u64, length: u64 },

    /// A required configuration value is missing or malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the Custodia crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
