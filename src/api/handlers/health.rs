//! Health check handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

/// Response for the health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Service name
    pub service: &'static str,
    /// Service version
    pub version: &'static str,
    /// Timestamp of health check
    pub timestamp: String,
    /// Tenants holding a reconciled batch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenants: Option<usize>,
    /// Active explanation provider
    pub explainer: &'static str,
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All components healthy
    Healthy,
    /// Shared state unreadable but the process is serving
    Degraded,
}

/// Liveness check.
///
/// Public route; reports degraded when the tenant store cannot be read.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let tenants = match state.tenant_store.tenant_count() {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "Tenant store unreadable during health check");
            None
        }
    };

    Json(HealthResponse {
        status: if tenants.is_some() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        service: "gst-reconciler",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        tenants,
        explainer: state.explainer.name(),
    })
}
