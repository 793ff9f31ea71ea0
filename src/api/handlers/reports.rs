//! Report handlers.

use axum::extract::{Extension, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::auth_helpers::require_tenant;
use crate::api::error::{ApiError, ErrorCode};
use crate::auth::TenantContextExt;
use crate::domain::{GstRiskReport, TenantId};
use crate::server::AppState;

const CONTENT_SHA256: HeaderName = HeaderName::from_static("x-content-sha256");
const REPORT_ID: HeaderName = HeaderName::from_static("x-report-id");

/// GET /reports/gst-risk - JSON risk report for the caller's current batch.
pub async fn gst_risk_report(
    State(state): State<AppState>,
    Extension(TenantContextExt(ctx)): Extension<TenantContextExt>,
) -> Result<Json<GstRiskReport>, ApiError> {
    let tenant_id = require_tenant(&ctx)?;
    let report = state.reports.synthesize(tenant_id)?;
    Ok(Json(report))
}

/// GET /reports/gst-risk/pdf - Downloadable PDF rendering of the same report.
pub async fn gst_risk_report_pdf(
    State(state): State<AppState>,
    Extension(TenantContextExt(ctx)): Extension<TenantContextExt>,
) -> Result<Response, ApiError> {
    let tenant_id = require_tenant(&ctx)?;
    let (report, document) = state.reports.synthesize_pdf(tenant_id)?;

    let disposition = HeaderValue::from_str(&attachment_disposition(tenant_id))
        .map_err(|e| ApiError::new(ErrorCode::RenderFailed, e.to_string()))?;
    let digest = HeaderValue::from_str(&document.sha256)
        .map_err(|e| ApiError::new(ErrorCode::RenderFailed, e.to_string()))?;
    let report_id = HeaderValue::from_str(&report.audit.report_id.to_string())
        .map_err(|e| ApiError::new(ErrorCode::RenderFailed, e.to_string()))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_SHA256, digest),
            (REPORT_ID, report_id),
        ],
        document.bytes,
    )
        .into_response())
}

fn attachment_disposition(tenant_id: &TenantId) -> String {
    let prefix = tenant_id.short_prefix(8);
    let prefix = if prefix.is_empty() { "tenant" } else { &prefix };
    format!("attachment; filename=\"GST_Trust_Report_{prefix}.pdf\"")
}
