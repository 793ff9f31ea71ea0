//! Tenant identification and request auditing
//!
//! Every request passes through [`audit_middleware`], which resolves the
//! caller's tenant, rejects tenant-less requests to protected routes, and
//! appends exactly one audit entry per request.
//!
//! # Tenant carriers
//!
//! - Cookie `gst_tenant_id` (checked first)
//! - Header `X-Tenant-ID`
//!
//! Blank values are treated as absent.
//!
//! # Public routes
//!
//! `/` exactly, and any path under `/onboarding`, `/static` or `/health`.
//! These run without a tenant and are audited under the `PUBLIC` sentinel.
//!
//! # Plan selection
//!
//! Header `X-Plan`, then cookie `gst_plan`, defaulting to BASIC.

mod middleware;

pub use middleware::*;

use axum::http::{header::COOKIE, HeaderMap};

use crate::domain::{PlanTier, TenantId, TENANT_PUBLIC};
use crate::infra::PipelineError;

pub const TENANT_COOKIE: &str = "gst_tenant_id";
pub const TENANT_HEADER: &str = "x-tenant-id";
pub const PLAN_COOKIE: &str = "gst_plan";
pub const PLAN_HEADER: &str = "x-plan";

const PUBLIC_PREFIXES: [&str; 3] = ["/onboarding", "/static", "/health"];

/// Tenant identity resolved for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantContext {
    Tenant(TenantId),
    /// Public route reached without a tenant
    Public,
}

impl TenantContext {
    pub fn tenant_id(&self) -> Option<&TenantId> {
        match self {
            TenantContext::Tenant(id) => Some(id),
            TenantContext::Public => None,
        }
    }

    /// Value recorded in the audit trail
    pub fn audit_label(&self) -> &str {
        match self {
            TenantContext::Tenant(id) => id.as_str(),
            TenantContext::Public => TENANT_PUBLIC,
        }
    }
}

/// Tenant context extension for request
#[derive(Debug, Clone)]
pub struct TenantContextExt(pub TenantContext);

/// Whether `path` may be served without a tenant.
pub fn is_public_path(path: &str) -> bool {
    path == "/" || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Value of cookie `name`, if any `Cookie` header carries it.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Resolve the tenant from the cookie, falling back to the header.
pub fn extract_tenant(headers: &HeaderMap) -> Option<TenantId> {
    cookie_value(headers, TENANT_COOKIE)
        .and_then(TenantId::parse)
        .or_else(|| header_value(headers, TENANT_HEADER).and_then(TenantId::parse))
}

/// Resolve the subscription plan for an ingestion request.
pub fn resolve_plan(headers: &HeaderMap) -> Result<PlanTier, PipelineError> {
    let raw = header_value(headers, PLAN_HEADER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| cookie_value(headers, PLAN_COOKIE).filter(|v| !v.is_empty()));

    match raw {
        Some(plan) => plan.parse().map_err(PipelineError::InvalidPlan),
        None => Ok(PlanTier::default()),
    }
}
