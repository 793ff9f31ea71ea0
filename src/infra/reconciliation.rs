//! Deterministic reconciliation engine
//!
//! Classifies each invoice against the simulated external ledger. The rules
//! are evaluated in a fixed priority order and the first match wins:
//!
//! 1. taxable value above 10,000 is risky credit
//! 2. IGST charged alongside a zero CGST or SGST is a tax-type mismatch
//! 3. every fifth position (0, 5, 10, ...) is absent from the ledger
//! 4. anything else matches

use rust_decimal::Decimal;

use crate::domain::{Invoice, ReconciliationResult, ReconciliationStatus};

/// Taxable value above which an invoice is always treated as risky.
pub const HIGH_VALUE_THRESHOLD: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Batch positions divisible by this are simulated as missing from GSTR-2B.
pub const MISSING_POSITION_MODULUS: usize = 5;

/// Classify one invoice at its 0-based position within the batch.
pub fn classify(invoice: &Invoice, position: usize) -> ReconciliationResult {
    let (status, explanation, suggested_action) = if invoice.taxable_value > HIGH_VALUE_THRESHOLD
    {
        (
            ReconciliationStatus::RiskyItc,
            "high value invoice, verify vendor filing",
            "hold payment",
        )
    } else if invoice.igst > Decimal::ZERO
        && (invoice.cgst.is_zero() || invoice.sgst.is_zero())
    {
        (
            ReconciliationStatus::PartialMatch,
            "tax-type mismatch, verify place of supply",
            "verify extraction",
        )
    } else if position % MISSING_POSITION_MODULUS == 0 {
        (
            ReconciliationStatus::MissingIn2b,
            "not found in external records",
            "follow up with vendor",
        )
    } else {
        (
            ReconciliationStatus::Matched,
            "exact match",
            "no action required",
        )
    };

    ReconciliationResult {
        invoice_number: invoice.invoice_number.clone(),
        gstin: invoice.gstin.clone(),
        status,
        explanation: explanation.to_string(),
        suggested_action: suggested_action.to_string(),
    }
}

/// Classify a whole batch; `results[i]` belongs to `invoices[i]`.
pub fn classify_batch(invoices: &[Invoice]) -> Vec<ReconciliationResult> {
    invoices
        .iter()
        .enumerate()
        .map(|(position, invoice)| classify(invoice, position))
        .collect()
}
