//! # custodia-codec
//!
//! Versioned canonical serialization and hashing for Custodia ledger
//! entries.
//!
//! The codec turns a structured audit event into a deterministic byte
//! string used for hashing: two logically identical events always
//! serialize identically regardless of metadata insertion order or numeric
//! formatting. The codec version is part of the hashed bytes so historical
//! entries keep verifying under the rules in force when they were written.

pub mod canonical;

pub use canonical::{
    canonical_bytes, entry_hash, payload_hash, payload_hash_for_entry, validate_event,
    CODEC_VERSION,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
