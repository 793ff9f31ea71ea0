//! The per-tenant unit of isolation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Invoice, PlanTier, ReconciliationResult, TenantId, VendorRiskSummary};

/// Latest ingested batch for a tenant together with everything derived from it.
///
/// A record is built completely before it is handed to the store and is never
/// mutated afterwards; a new upload replaces it wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct TenantRecord {
    pub tenant_id: TenantId,
    pub plan: PlanTier,
    pub invoices: Vec<Invoice>,
    /// `results[i]` classifies `invoices[i]`.
    pub results: Vec<ReconciliationResult>,
    pub vendor_summary: Vec<VendorRiskSummary>,
    pub ingested_at: DateTime<Utc>,
}

impl TenantRecord {
    /// Invoice/result pairs in batch order.
    pub fn pairs(&self) -> impl Iterator<Item = (&Invoice, &ReconciliationResult)> {
        self.invoices.iter().zip(self.results.iter())
    }
}
