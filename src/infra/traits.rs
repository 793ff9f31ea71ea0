//! Trait definitions for the reconciliation service's shared state and collaborators

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{ExplainRequest, ExplainResponse, TenantId, TenantRecord};

use super::audit::{AuditError, AuditLogEntry, AuditQueryFilters};
use super::Result;

/// Authoritative per-tenant state.
///
/// Invariant: a reader observes either the previous record or the new one in
/// full, never a mixture.
#[cfg_attr(test, automock)]
pub trait TenantStore: Send + Sync {
    /// Replace the tenant's entire record, keyed by `record.tenant_id`.
    fn put(&self, record: Arc<TenantRecord>) -> Result<()>;

    /// Read-only view of the tenant's latest record
    fn get(&self, tenant_id: &TenantId) -> Result<Option<Arc<TenantRecord>>>;

    /// Number of tenants holding a batch
    fn tenant_count(&self) -> Result<usize>;
}

/// Append-only audit trail.
///
/// `append` is called from a drop guard, so implementations must not block on
/// anything other than a short in-memory lock.
#[cfg_attr(test, automock)]
pub trait AuditRepository: Send + Sync {
    /// Append one entry
    fn append(&self, entry: AuditLogEntry) -> std::result::Result<(), AuditError>;

    /// Snapshot of every entry in append order
    fn get_all(&self) -> std::result::Result<Vec<AuditLogEntry>, AuditError>;

    /// Entries recorded for `tenant_id`, filtered and newest last.
    fn query(
        &self,
        tenant_id: &str,
        filters: &AuditQueryFilters,
    ) -> std::result::Result<Vec<AuditLogEntry>, AuditError> {
        let mut entries: Vec<AuditLogEntry> = self
            .get_all()?
            .into_iter()
            .filter(|entry| entry.tenant_id == tenant_id && filters.matches(entry))
            .collect();

        if let Some(limit) = filters.limit {
            let skip = entries.len().saturating_sub(limit);
            entries.drain(..skip);
        }
        Ok(entries)
    }
}

/// Produces a human-readable explanation for a reconciliation outcome.
///
/// Implementations never fail and never change the status they are asked
/// about: `original_status` always echoes the request.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(&self, request: &ExplainRequest) -> ExplainResponse;

    /// Short label for logs and health output
    fn name(&self) -> &'static str;
}
