//! Tenant helper functions for REST API handlers.

use crate::api::error::{ApiError, ErrorCode};
use crate::auth::TenantContext;
use crate::domain::TenantId;

/// Ensure the request resolved to a tenant.
///
/// The audit middleware already rejects tenant-less requests on protected
/// routes, so this only fails if a public route calls it.
pub fn require_tenant(ctx: &TenantContext) -> Result<&TenantId, ApiError> {
    ctx.tenant_id()
        .ok_or_else(|| ApiError::new(ErrorCode::MissingTenant, "Missing tenant identifier"))
}
