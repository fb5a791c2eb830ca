//! # custodia-core
//!
//! The write side of the Custodia ledger:
//!
//! - The `ChainStore` storage contract and its in-memory reference
//!   implementation
//! - The `ChainAppender` append protocol (optimistic, single-writer per
//!   tenant)
//! - The `RecoveryCoordinator` quarantine/resume path
//! - Ledger configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custodia_core::{ChainAppender, MemoryChainStore};
//!
//! let store = Arc::new(MemoryChainStore::new());
//! let appender = ChainAppender::new(store.clone());
//! let entry = appender.append(&tenant, &event)?;
//! ```

pub mod appender;
pub mod config;
pub mod memory;
pub mod recovery;
pub mod traits;

pub use appender::ChainAppender;
pub use config::LedgerConfig;
pub use memory::MemoryChainStore;
pub use recovery::RecoveryCoordinator;
pub use traits::{ChainStore, CommitOutcome};

// ── Tests ─────────────────────────────────────────────────────────────────────
