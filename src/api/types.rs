//! Shared request and response types for REST API handlers.

use serde::{Deserialize, Serialize};

use crate::domain::{
    PlanTier, RawInvoice, ReconciliationResult, TenantId, TenantRecord, VendorRiskSummary,
};
use crate::infra::AuditLogEntry;

// ============================================================================
// Ingest types
// ============================================================================

/// Request body for JSON reconciliation.
#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub invoices: Vec<RawInvoice>,
}

/// Response for both CSV upload and JSON reconciliation.
#[derive(Debug, Serialize)]
pub struct IngestResponse<'a> {
    pub status: &'static str,
    pub tenant_id: &'a TenantId,
    pub plan: PlanTier,
    pub total_invoices: usize,
    pub results: &'a [ReconciliationResult],
    pub vendor_summary: &'a [VendorRiskSummary],
}

impl<'a> From<&'a TenantRecord> for IngestResponse<'a> {
    fn from(record: &'a TenantRecord) -> Self {
        Self {
            status: "success",
            tenant_id: &record.tenant_id,
            plan: record.plan,
            total_invoices: record.invoices.len(),
            results: &record.results,
            vendor_summary: &record.vendor_summary,
        }
    }
}

// ============================================================================
// Audit types
// ============================================================================

/// Response for the audit log listing.
#[derive(Debug, Serialize)]
pub struct AuditLogsResponse {
    pub tenant_id: TenantId,
    pub count: usize,
    pub entries: Vec<AuditLogEntry>,
}
