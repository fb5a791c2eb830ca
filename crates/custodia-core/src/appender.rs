//! The append protocol: the sole write path into a tenant's chain.
//!
//! Append algorithm:
//!
//! 1. Validate the event via the codec — a rejected event leaves the
//!    ledger untouched.
//! 2. Read the tenant's tail (`last_sequence`, `last_entry_hash`,
//!    `version`).
//! 3. Canonicalize and hash: `payload_hash` from the canonical bytes,
//!    `entry_hash` from `(previous_hash, payload_hash, sequence, tenant)`.
//! 4. Commit atomically with a compare-and-swap on the tail version. On
//!    conflict, back off and retry from step 2, up to the configured
//!    attempt bound; exhaustion surfaces as a contention error — never a
//!    silent drop.

use std::cmp;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use custodia_codec as codec;
use custodia_contracts::{
    entry::{AuditEntry, AuditEvent, TenantId},
    error::{LedgerError, LedgerResult},
};

use crate::{
    config::LedgerConfig,
    traits::{ChainStore, CommitOutcome},
};

/// Appends entries to tenant chains. The only component that writes
/// `AuditEntry` rows; everything else is a read-only consumer.
pub struct ChainAppender {
    store: Arc<dyn ChainStore>,
    config: LedgerConfig,
}

impl ChainAppender {
    /// Create an appender with default configuration.
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<dyn ChainStore>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Append one event to the tenant's chain and return the committed
    /// entry.
    ///
    /// At most one entry is committed per call. On success the entry's
    /// `previous_hash` links to the prior tail and its sequence is exactly
    /// `last_sequence + 1` — the commit's version check makes duplicates
    /// and gaps impossible even under concurrent callers.
    ///
    /// # Errors
    ///
    /// - `Validation` — the event is outside the supported schema; nothing
    ///   was recorded.
    /// - `Contention` — the tail kept moving for the full attempt budget;
    ///   nothing was recorded by this call.
    /// - `Integrity` — the chain is quarantined and awaiting resume.
    /// - `Durability` — the store failed; the caller must treat the event
    ///   as unrecorded.
    pub fn append(&self, tenant: &TenantId, event: &AuditEvent) -> LedgerResult<AuditEntry> {
        codec::validate_event(tenant, event)?;

        let max_attempts = cmp::max(1, self.config.max_append_attempts);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let tail = self.store.tail(tenant)?;
            let sequence = tail.last_sequence + 1;

            // Timestamps are evidentiary, never an ordering authority;
            // clamp them non-decreasing within the chain.
            let timestamp = cmp::max(Utc::now(), tail.last_timestamp);

            let payload_hash = codec::payload_hash(tenant, sequence, timestamp, event)?;
            let entry_hash =
                codec::entry_hash(&tail.last_entry_hash, &payload_hash, sequence, tenant);

            let entry = AuditEntry {
                tenant_id: tenant.clone(),
                sequence,
                timestamp,
                actor: event.actor.clone(),
                action: event.action.clone(),
                resource_type: event.resource_type.clone(),
                resource_id: event.resource_id.clone(),
                metadata: event.metadata.clone(),
                codec_version: codec::CODEC_VERSION,
                payload_hash,
                previous_hash: tail.last_entry_hash.clone(),
                entry_hash,
            };

            match self.store.commit(entry.clone(), tail.version)? {
                CommitOutcome::Committed(_) => {
                    debug!(
                        tenant = %tenant,
                        sequence,
                        action = %entry.action,
                        entry_hash = %entry.entry_hash,
                        "entry committed"
                    );
                    return Ok(entry);
                }
                CommitOutcome::Conflict { current } => {
                    if attempts >= max_attempts {
                        warn!(
                            tenant = %tenant,
                            attempts,
                            "append abandoned after repeated tail conflicts"
                        );
                        return Err(LedgerError::Contention {
                            tenant: tenant.to_string(),
                            attempts,
                        });
                    }
                    debug!(
                        tenant = %tenant,
                        attempt = attempts,
                        observed_version = tail.version,
                        current_version = current.version,
                        "tail moved during append; retrying"
                    );
                    if self.config.retry_backoff_ms > 0 {
                        std::thread::sleep(Duration::from_millis(
                            self.config.retry_backoff_ms * u64::from(attempts),
                        ));
                    }
                }
            }
        }
    }
}
