//! GST risk report shape.
//!
//! Both the JSON and the PDF view are produced from one [`GstRiskReport`]
//! value; any field added here must be rendered by both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ReconciliationStatus, VendorRiskLevel};

/// Version tag of the reconciliation rules the report was computed with.
pub const RECONCILIATION_VERSION: &str = "1.0.0";

/// Data sources listed in every report.
pub const DATA_SOURCES: [&str; 2] = ["User_Upload", "Government_Portal_Mock"];

/// Maximum number of per-invoice rows carried in a report.
pub const MAX_INVOICE_DETAILS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub name: String,
    pub gstin: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub total_invoices: usize,
    pub matched_count: usize,
    pub partial_match_count: usize,
    pub missing_in_2b_count: usize,
    pub risky_itc_count: usize,
    pub total_taxable_value: f64,
    pub total_itc_available: f64,
    pub risky_itc_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSummaryItem {
    pub vendor_gstin: String,
    pub total_invoices: usize,
    pub risky_count: usize,
    pub risky_itc_amount: f64,
    pub risk_level: VendorRiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDetail {
    pub invoice_number: String,
    pub gstin: String,
    pub status: ReconciliationStatus,
    pub taxable_value: f64,
    pub itc_amount: f64,
    pub suggested_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub finding_summary: String,
    /// 0 to 100
    pub risk_score: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAudit {
    pub generated_at: DateTime<Utc>,
    pub report_id: Uuid,
    pub reconciliation_version: String,
    pub data_sources: Vec<String>,
}

/// Synthesized compliance report for one tenant batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstRiskReport {
    pub business: BusinessInfo,
    pub summary: ReconciliationSummary,
    pub vendor_summary: Vec<VendorSummaryItem>,
    pub invoice_details: Vec<InvoiceDetail>,
    pub risk_assessment: RiskAssessment,
    pub audit: ReportAudit,
}
