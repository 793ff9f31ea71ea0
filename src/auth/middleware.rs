//! Tenant isolation and audit middleware for Axum
//!
//! Resolves the tenant, buffers and hashes both bodies, and appends one audit
//! entry per request. The entry is owned by a drop guard, so it is written
//! even when the handler panics or the request future is cancelled.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::crypto::sha256_hex;
use crate::infra::{AuditLogBuilder, AuditRepository};

use super::{extract_tenant, is_public_path, TenantContext, TenantContextExt};

/// Default cap on buffered request bodies (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Audit middleware configuration/state.
#[derive(Clone)]
pub struct AuditMiddlewareState {
    pub audit: Arc<dyn AuditRepository>,
    /// Requests with larger bodies are rejected with 413.
    pub max_body_bytes: usize,
}

impl AuditMiddlewareState {
    pub fn new(audit: Arc<dyn AuditRepository>) -> Self {
        Self {
            audit,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Holds the pending entry; whatever is left at drop time is appended.
struct AuditGuard {
    audit: Arc<dyn AuditRepository>,
    entry: Option<AuditLogBuilder>,
}

impl AuditGuard {
    fn new(audit: Arc<dyn AuditRepository>, entry: AuditLogBuilder) -> Self {
        Self {
            audit,
            entry: Some(entry),
        }
    }

    fn update(&mut self, f: impl FnOnce(AuditLogBuilder) -> AuditLogBuilder) {
        self.entry = self.entry.take().map(f);
    }

    fn commit(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        if let Some(builder) = self.entry.take() {
            if let Err(e) = self.audit.append(builder.build()) {
                tracing::error!(error = %e, "Failed to append audit log entry");
            }
        }
    }
}

impl Drop for AuditGuard {
    fn drop(&mut self) {
        if self.entry.is_some() {
            tracing::warn!("Request ended before completion, auditing as failure");
        }
        // builders default to FAILURE until a response status is recorded
        self.flush();
    }
}

fn detail_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(serde_json::json!({ "detail": detail }))).into_response()
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Tenant isolation and audit middleware
pub async fn audit_middleware(
    State(state): State<AuditMiddlewareState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().to_string();
    let mut guard = AuditGuard::new(state.audit.clone(), AuditLogBuilder::new(&path, &method));

    let context = match extract_tenant(request.headers()) {
        Some(tenant_id) => TenantContext::Tenant(tenant_id),
        None if is_public_path(&path) => TenantContext::Public,
        None => {
            tracing::warn!(method = %method, path = %path, "Rejected request without tenant");
            let response = detail_response(StatusCode::BAD_REQUEST, "Missing tenant identifier");
            guard.update(|b| b.http_status(response.status().as_u16()));
            guard.commit();
            return response;
        }
    };
    guard.update(|b| b.tenant_id(context.audit_label()));

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let response = if is_length_limit(&e) {
                detail_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    &format!("Request body exceeds {} bytes", state.max_body_bytes),
                )
            } else {
                tracing::warn!(error = %e, path = %path, "Failed to read request body");
                detail_response(StatusCode::BAD_REQUEST, "Failed to read request body")
            };
            guard.update(|b| b.http_status(response.status().as_u16()));
            guard.commit();
            return response;
        }
    };
    guard.update(|b| b.input_hash(sha256_hex(&bytes)));

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(TenantContextExt(context));

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, path = %path, "Failed to buffer response body");
            let response = detail_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            guard.update(|b| b.http_status(response.status().as_u16()));
            guard.commit();
            return response;
        }
    };
    guard.update(|b| {
        b.output_hash(sha256_hex(&bytes))
            .http_status(parts.status.as_u16())
    });
    guard.commit();

    Response::from_parts(parts, Body::from(bytes))
}
