//! Audit log handlers.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Extension, Query, State};
use axum::Json;

use crate::api::auth_helpers::require_tenant;
use crate::api::error::{invalid_body, ApiError};
use crate::api::types::AuditLogsResponse;
use crate::auth::TenantContextExt;
use crate::infra::AuditQueryFilters;
use crate::server::AppState;

/// GET /audit/logs - The caller's own audit entries, oldest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Extension(TenantContextExt(ctx)): Extension<TenantContextExt>,
    filters: Result<Query<AuditQueryFilters>, QueryRejection>,
) -> Result<Json<AuditLogsResponse>, ApiError> {
    let tenant_id = require_tenant(&ctx)?;
    let Query(filters) = filters.map_err(|rejection| invalid_body(rejection.body_text()))?;

    let entries = state.audit_log.query(tenant_id.as_str(), &filters)?;

    Ok(Json(AuditLogsResponse {
        tenant_id: tenant_id.clone(),
        count: entries.len(),
        entries,
    }))
}
