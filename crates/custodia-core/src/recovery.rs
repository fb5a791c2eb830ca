//! Recovery coordination after a failed verification.
//!
//! A broken link is never auto-repaired and never deleted. The coordinator
//! quarantines the suspect range (readable forensically, excluded from
//! verification and export success) and reopens the chain for appending at
//! a documented fork point — new entries link to the last known-good entry
//! rather than silently overwriting history.

use std::sync::Arc;

use tracing::{info, warn};

use custodia_contracts::{
    entry::{ChainTail, TenantId},
    error::{LedgerError, LedgerResult},
    recovery::QuarantineRecord,
    report::VerificationReport,
};

use crate::traits::ChainStore;

pub struct RecoveryCoordinator {
    store: Arc<dyn ChainStore>,
}

impl RecoveryCoordinator {
    pub fn new(store: Arc<dyn ChainStore>) -> Self {
        Self { store }
    }

    /// Quarantine `[first_invalid, tail]` based on a failed verification
    /// report.
    ///
    /// Appends to the tenant's chain are refused until
    /// `resume_chain_from` acknowledges the fork point. A passing report
    /// is rejected — quarantine is only ever a response to evidence.
    pub fn quarantine(
        &self,
        tenant: &TenantId,
        report: &VerificationReport,
    ) -> LedgerResult<QuarantineRecord> {
        if report.valid {
            return Err(LedgerError::Validation {
                reason: "verification report is a pass; nothing to quarantine".to_string(),
            });
        }
        let fault = report
            .reason
            .clone()
            .ok_or_else(|| LedgerError::Validation {
                reason: "failure report carries no fault".to_string(),
            })?;

        let record = self
            .store
            .quarantine_range(tenant, fault.sequence(), fault)?;

        warn!(
            tenant = %tenant,
            from = record.from_sequence,
            to = record.to_sequence,
            "quarantine applied; operator action required before appends resume"
        );
        Ok(record)
    }

    /// Reopen a quarantined chain for appending from `last_good_sequence`.
    ///
    /// The next append links its `previous_hash` to the last good entry,
    /// making the fork point explicit in the chain itself. Quarantined
    /// ranges stay on record permanently.
    pub fn resume_chain_from(
        &self,
        tenant: &TenantId,
        last_good_sequence: u64,
    ) -> LedgerResult<ChainTail> {
        let tail = self.store.resume_from(tenant, last_good_sequence)?;
        info!(
            tenant = %tenant,
            fork_point = last_good_sequence,
            fork_hash = %tail.last_entry_hash,
            "chain resumed from last known-good entry"
        );
        Ok(tail)
    }
}
