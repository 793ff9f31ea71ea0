//! Report synthesis from a stored tenant batch.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    BusinessInfo, GstRiskReport, InvoiceDetail, ReconciliationStatus, ReconciliationSummary,
    ReportAudit, RiskAssessment, TenantId, TenantRecord, VendorRiskLevel, VendorSummaryItem,
    DATA_SOURCES, MAX_INVOICE_DETAILS, RECONCILIATION_VERSION,
};
use crate::infra::TenantStore;

use super::{render_report, RenderedDocument, ReportError};

/// Reads tenant batches from the store and derives reports from them.
pub struct ReportSynthesizer {
    store: Arc<dyn TenantStore>,
}

impl ReportSynthesizer {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Synthesize the JSON report for a tenant's latest batch.
    pub fn synthesize(&self, tenant_id: &TenantId) -> Result<GstRiskReport, ReportError> {
        let record = self
            .store
            .get(tenant_id)?
            .ok_or_else(|| ReportError::NotFound(tenant_id.to_string()))?;
        build_report(&record)
    }

    /// Synthesize the report and render its document view.
    pub fn synthesize_pdf(
        &self,
        tenant_id: &TenantId,
    ) -> Result<(GstRiskReport, RenderedDocument), ReportError> {
        let report = self.synthesize(tenant_id)?;
        let document = render_report(&report)?;
        tracing::info!(
            tenant_id = %tenant_id,
            report_id = %report.audit.report_id,
            bytes = document.bytes.len(),
            sha256 = %document.sha256,
            "Rendered GST risk report"
        );
        Ok((report, document))
    }
}

/// Stable report identifier for one stored batch.
pub fn report_id(record: &TenantRecord) -> Uuid {
    let name = format!(
        "{}:{}",
        record.tenant_id,
        record.ingested_at.timestamp_nanos_opt().unwrap_or_default()
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Percentage of vendors rated HIGH, rounded to 2 dp.
///
/// 100.0 when there is nothing to assess and 0.0 when there are results but
/// no vendors.
pub fn risk_score(result_count: usize, high_vendors: usize, vendors: usize) -> f64 {
    if result_count == 0 {
        return 100.0;
    }
    if vendors == 0 {
        return 0.0;
    }
    money(Decimal::from(high_vendors * 100) / Decimal::from(vendors))
}

fn money(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or_default()
}

/// Derive the report from a stored batch. Never re-classifies.
pub fn build_report(record: &TenantRecord) -> Result<GstRiskReport, ReportError> {
    if record.results.is_empty() {
        return Err(ReportError::NotFound(record.tenant_id.to_string()));
    }

    let mut summary = ReconciliationSummary {
        total_invoices: record.invoices.len(),
        ..Default::default()
    };
    for result in &record.results {
        match result.status {
            ReconciliationStatus::Matched => summary.matched_count += 1,
            ReconciliationStatus::PartialMatch => summary.partial_match_count += 1,
            ReconciliationStatus::MissingIn2b => summary.missing_in_2b_count += 1,
            ReconciliationStatus::RiskyItc => summary.risky_itc_count += 1,
        }
    }

    let total_taxable: Decimal = record.invoices.iter().map(|i| i.taxable_value).sum();
    let total_itc: Decimal = record.invoices.iter().map(|i| i.itc_amount()).sum();
    let risky_itc: Decimal = record
        .pairs()
        .filter(|(_, result)| result.status.puts_credit_at_risk())
        .map(|(invoice, _)| invoice.itc_amount())
        .sum();
    summary.total_taxable_value = money(total_taxable);
    summary.total_itc_available = money(total_itc);
    summary.risky_itc_amount = money(risky_itc);

    let vendor_summary: Vec<VendorSummaryItem> = record
        .vendor_summary
        .iter()
        .map(|v| VendorSummaryItem {
            vendor_gstin: v.vendor_gstin.to_string(),
            total_invoices: v.total_invoices,
            risky_count: v.risky_count,
            risky_itc_amount: money(v.risky_itc_amount),
            risk_level: v.vendor_risk_level,
        })
        .collect();

    let invoice_details = record
        .pairs()
        .take(MAX_INVOICE_DETAILS)
        .map(|(invoice, result)| InvoiceDetail {
            invoice_number: result.invoice_number.clone(),
            gstin: result.gstin.to_string(),
            status: result.status,
            taxable_value: money(invoice.taxable_value),
            itc_amount: money(invoice.itc_amount()),
            suggested_action: result.suggested_action.clone(),
        })
        .collect();

    let high_vendors = vendor_summary
        .iter()
        .filter(|v| v.risk_level == VendorRiskLevel::High)
        .count();
    let risk_assessment = if high_vendors > 0 {
        RiskAssessment {
            finding_summary: format!(
                "Found {} risky invoices and {} high-risk vendors.",
                summary.risky_itc_count, high_vendors
            ),
            risk_score: risk_score(record.results.len(), high_vendors, vendor_summary.len()),
            recommendation: "Review high-risk vendors before filing.".to_string(),
        }
    } else {
        RiskAssessment {
            finding_summary: "No critical risks identified.".to_string(),
            risk_score: risk_score(record.results.len(), high_vendors, vendor_summary.len()),
            recommendation: "Proceed with filing.".to_string(),
        }
    };

    Ok(GstRiskReport {
        business: BusinessInfo {
            name: "-".to_string(),
            gstin: record
                .invoices
                .first()
                .map(|i| i.gstin.to_string())
                .unwrap_or_else(|| "-".to_string()),
            tenant_id: record.tenant_id.to_string(),
        },
        summary,
        vendor_summary,
        invoice_details,
        risk_assessment,
        audit: ReportAudit {
            generated_at: Utc::now(),
            report_id: report_id(record),
            reconciliation_version: RECONCILIATION_VERSION.to_string(),
            data_sources: DATA_SOURCES.iter().map(|s| s.to_string()).collect(),
        },
    })
}
