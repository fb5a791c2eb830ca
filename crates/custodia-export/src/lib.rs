//! # custodia-export
//!
//! Signed export artifacts for the Custodia ledger.
//!
//! [`exporter::SegmentExporter`] cuts a verified chain range into a
//! portable, ed25519-signed [`ChainSegment`] for evidence packages and
//! external auditors. [`exporter::import_and_verify`] re-verifies an
//! artifact standalone: chain links and signature both must pass.

pub mod exporter;

pub use exporter::{import_and_verify, segment_signing_bytes, SegmentExporter};

pub use custodia_contracts::segment::ChainSegment;

// ── Tests ─────────────────────────────────────────────────────────────────────
