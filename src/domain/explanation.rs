//! Mismatch explanation request/response.

use serde::{Deserialize, Serialize};

use super::ReconciliationStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub invoice_number: String,
    pub gstin: String,
    pub status: ReconciliationStatus,
    #[serde(default)]
    pub factual_diffs: serde_json::Map<String, serde_json::Value>,
}

/// Explanation payload. `original_status` always echoes the request status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
    pub root_cause: String,
    pub suggested_action: String,
    pub original_status: ReconciliationStatus,
}
