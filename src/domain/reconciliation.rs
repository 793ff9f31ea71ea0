//! Reconciliation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Gstin;

/// Outcome of reconciling one invoice against the external ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    #[serde(rename = "MATCHED")]
    Matched,
    #[serde(rename = "PARTIAL_MATCH")]
    PartialMatch,
    #[serde(rename = "MISSING_IN_2B")]
    MissingIn2b,
    #[serde(rename = "RISKY_ITC")]
    RiskyItc,
}

impl ReconciliationStatus {
    pub const ALL: [ReconciliationStatus; 4] = [
        ReconciliationStatus::Matched,
        ReconciliationStatus::PartialMatch,
        ReconciliationStatus::MissingIn2b,
        ReconciliationStatus::RiskyItc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::Matched => "MATCHED",
            ReconciliationStatus::PartialMatch => "PARTIAL_MATCH",
            ReconciliationStatus::MissingIn2b => "MISSING_IN_2B",
            ReconciliationStatus::RiskyItc => "RISKY_ITC",
        }
    }

    /// Statuses whose credit is at risk in the report's risky ITC total.
    pub fn puts_credit_at_risk(&self) -> bool {
        matches!(
            self,
            ReconciliationStatus::RiskyItc | ReconciliationStatus::MissingIn2b
        )
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a single invoice. Positionally paired with its invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub invoice_number: String,
    pub gstin: Gstin,
    pub status: ReconciliationStatus,
    pub explanation: String,
    pub suggested_action: String,
}
