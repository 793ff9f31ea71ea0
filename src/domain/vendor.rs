//! Vendor-level risk summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Gstin;

/// Risk classification of a vendor across a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VendorRiskLevel {
    High,
    Medium,
    Low,
}

impl VendorRiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorRiskLevel::High => "HIGH",
            VendorRiskLevel::Medium => "MEDIUM",
            VendorRiskLevel::Low => "LOW",
        }
    }

    /// Derive the level from fully accumulated counts.
    pub fn derive(total: usize, matched: usize, missing: usize, risky: usize) -> Self {
        if risky > 0 || missing > 0 {
            VendorRiskLevel::High
        } else if matched < total {
            VendorRiskLevel::Medium
        } else {
            VendorRiskLevel::Low
        }
    }
}

impl fmt::Display for VendorRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated reconciliation outcome for one GSTIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRiskSummary {
    pub vendor_gstin: Gstin,
    pub total_invoices: usize,
    pub matched_count: usize,
    pub missing_in_2b_count: usize,
    pub risky_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_taxable_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_itc_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub risky_itc_amount: Decimal,
    pub vendor_risk_level: VendorRiskLevel,
}
