//! Invoice ingestion handlers.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::auth_helpers::require_tenant;
use crate::api::error::{invalid_body, ApiError};
use crate::api::types::{IngestResponse, ReconcileRequest};
use crate::auth::{resolve_plan, TenantContextExt};
use crate::server::AppState;

/// POST /invoices/upload - Ingest a CSV batch, replacing the tenant's prior batch.
pub async fn upload_invoices(
    State(state): State<AppState>,
    Extension(TenantContextExt(ctx)): Extension<TenantContextExt>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let tenant_id = require_tenant(&ctx)?;
    let plan = resolve_plan(&headers)?;

    let record = state.ingest.ingest_csv(tenant_id, plan, &body)?;

    Ok(Json(IngestResponse::from(&*record)).into_response())
}

/// POST /reconcile - Ingest a JSON batch through the same pipeline as CSV.
pub async fn reconcile_invoices(
    State(state): State<AppState>,
    Extension(TenantContextExt(ctx)): Extension<TenantContextExt>,
    headers: HeaderMap,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let tenant_id = require_tenant(&ctx)?;
    let Json(request) = payload.map_err(|rejection| invalid_body(rejection.body_text()))?;
    let plan = resolve_plan(&headers)?;

    let record = state.ingest.ingest_rows(tenant_id, plan, request.invoices)?;

    Ok(Json(IngestResponse::from(&*record)).into_response())
}
