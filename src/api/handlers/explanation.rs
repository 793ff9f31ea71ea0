//! Mismatch explanation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::{invalid_body, ApiError};
use crate::domain::{ExplainRequest, ExplainResponse};
use crate::server::AppState;

/// POST /explain-mismatch - Narrative explanation for a flagged invoice.
///
/// Provider faults resolve to the fallback payload; the reconciliation status
/// is echoed back untouched.
pub async fn explain_mismatch(
    State(state): State<AppState>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| invalid_body(rejection.body_text()))?;

    tracing::debug!(
        invoice_number = %request.invoice_number,
        provider = state.explainer.name(),
        "Explaining mismatch"
    );

    Ok(Json(state.explainer.explain(&request).await))
}
