//! Vendor risk aggregation over one reconciled batch.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{
    Gstin, Invoice, ReconciliationResult, ReconciliationStatus, VendorRiskLevel,
    VendorRiskSummary,
};

use super::{PipelineError, Result};

#[derive(Default)]
struct Accumulator {
    total: usize,
    matched: usize,
    missing: usize,
    risky: usize,
    taxable: Decimal,
    itc: Decimal,
    risky_itc: Decimal,
}

impl Accumulator {
    fn add(&mut self, invoice: &Invoice, status: ReconciliationStatus) {
        let itc = invoice.itc_amount();
        self.total += 1;
        self.taxable += invoice.taxable_value;
        self.itc += itc;
        match status {
            ReconciliationStatus::Matched => self.matched += 1,
            ReconciliationStatus::MissingIn2b => self.missing += 1,
            ReconciliationStatus::RiskyItc => {
                self.risky += 1;
                self.risky_itc += itc;
            }
            ReconciliationStatus::PartialMatch => {}
        }
    }

    fn finish(self, vendor_gstin: Gstin) -> VendorRiskSummary {
        VendorRiskSummary {
            vendor_gstin,
            total_invoices: self.total,
            matched_count: self.matched,
            missing_in_2b_count: self.missing,
            risky_count: self.risky,
            total_taxable_value: self.taxable,
            total_itc_amount: self.itc,
            risky_itc_amount: self.risky_itc,
            vendor_risk_level: VendorRiskLevel::derive(
                self.total,
                self.matched,
                self.missing,
                self.risky,
            ),
        }
    }
}

/// Group a reconciled batch by vendor GSTIN.
///
/// `results[i]` must classify `invoices[i]`. Output is sorted by risk level
/// name ascending (HIGH, LOW, MEDIUM), then by risky ITC descending, with
/// remaining ties in first-encounter order.
pub fn aggregate(
    invoices: &[Invoice],
    results: &[ReconciliationResult],
) -> Result<Vec<VendorRiskSummary>> {
    if invoices.len() != results.len() {
        return Err(PipelineError::InvariantViolation {
            invariant: "positional_correspondence".to_string(),
            message: format!(
                "{} invoices but {} reconciliation results",
                invoices.len(),
                results.len()
            ),
        });
    }

    let mut index: HashMap<&Gstin, usize> = HashMap::new();
    let mut groups: Vec<(&Gstin, Accumulator)> = Vec::new();

    for (position, (invoice, result)) in invoices.iter().zip(results).enumerate() {
        if result.gstin != invoice.gstin || result.invoice_number != invoice.invoice_number {
            return Err(PipelineError::InvariantViolation {
                invariant: "positional_correspondence".to_string(),
                message: format!(
                    "result at position {position} is for {} / {}, invoice is {} / {}",
                    result.gstin, result.invoice_number, invoice.gstin, invoice.invoice_number
                ),
            });
        }

        let slot = *index.entry(&invoice.gstin).or_insert_with(|| {
            groups.push((&invoice.gstin, Accumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.add(invoice, result.status);
    }

    let mut summaries: Vec<VendorRiskSummary> = groups
        .into_iter()
        .map(|(gstin, acc)| acc.finish(gstin.clone()))
        .collect();

    summaries.sort_by(|a, b| {
        a.vendor_risk_level
            .as_str()
            .cmp(b.vendor_risk_level.as_str())
            .then_with(|| b.risky_itc_amount.cmp(&a.risky_itc_amount))
    });

    Ok(summaries)
}
