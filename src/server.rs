//! HTTP server bootstrap for the GST reconciliation service.
//!
//! This module wires together:
//! - configuration
//! - shared state (tenant store, audit log, explanation provider)
//! - core services (ingestion, report synthesis)
//! - the Axum router behind the audit middleware

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, Uri};
use axum::Router;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::error::{not_found, ApiError};
use crate::auth::{AuditMiddlewareState, DEFAULT_MAX_BODY_BYTES, PLAN_HEADER, TENANT_HEADER};
use crate::infra::{
    explainer_from_config, shutdown_signal, AuditRepository, ExplainerConfig,
    ExplanationProvider, InMemoryAuditLog, InMemoryTenantStore, IngestService, TenantStore,
    DEFAULT_EXPLAIN_API_URL, DEFAULT_EXPLAIN_MODEL, DEFAULT_EXPLAIN_TIMEOUT,
};
use crate::report::ReportSynthesizer;
use crate::telemetry::{init_telemetry, TelemetryConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Largest request body the audit middleware will buffer.
    pub max_body_bytes: usize,
    /// Comma separated origins, or `*`.
    pub cors_allow_origins: Option<String>,
    /// Live explanation settings; `None` selects the fallback explainer.
    pub explainer: Option<ExplainerConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port: u16 = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {host}:{port}: {e}"))?;

        let max_body_bytes: usize = lookup("MAX_BODY_BYTES")
            .and_then(|v| v.parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let explainer = lookup("EXPLAIN_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .map(|key| ExplainerConfig {
                api_key: key,
                api_url: lookup("EXPLAIN_API_URL")
                    .unwrap_or_else(|| DEFAULT_EXPLAIN_API_URL.to_string()),
                model: lookup("EXPLAIN_MODEL").unwrap_or_else(|| DEFAULT_EXPLAIN_MODEL.to_string()),
                timeout: lookup("EXPLAIN_TIMEOUT_MS")
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_EXPLAIN_TIMEOUT),
            });

        Ok(Self {
            listen_addr,
            max_body_bytes,
            cors_allow_origins,
            explainer,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub tenant_store: Arc<dyn TenantStore>,
    pub audit_log: Arc<dyn AuditRepository>,
    pub ingest: Arc<IngestService>,
    pub reports: Arc<ReportSynthesizer>,
    pub explainer: Arc<dyn ExplanationProvider>,
}

impl AppState {
    pub fn new(
        tenant_store: Arc<dyn TenantStore>,
        audit_log: Arc<dyn AuditRepository>,
        explainer: Arc<dyn ExplanationProvider>,
    ) -> Self {
        Self {
            ingest: Arc::new(IngestService::new(tenant_store.clone())),
            reports: Arc::new(ReportSynthesizer::new(tenant_store.clone())),
            tenant_store,
            audit_log,
            explainer,
        }
    }

    /// Process-local store and audit log.
    pub fn in_memory(explainer: Arc<dyn ExplanationProvider>) -> Self {
        Self::new(
            Arc::new(InMemoryTenantStore::new()),
            Arc::new(InMemoryAuditLog::new()),
            explainer,
        )
    }
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    info!("Starting GST Reconciler v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max body bytes: {}", config.max_body_bytes);

    let explainer = explainer_from_config(config.explainer.clone());
    info!("  Explanation provider: {}", explainer.name());

    let state = AppState::in_memory(explainer);

    let mut app = build_router(state, config.max_body_bytes);
    if let Some(cors_layer) = cors_layer(config.cors_allow_origins.as_deref())? {
        app = app.layer(cors_layer);
    }

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("GST Reconciler is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Assemble the full application: routes, audit middleware, body limit and tracing.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let audit_state =
        AuditMiddlewareState::new(state.audit_log.clone()).with_max_body_bytes(max_body_bytes);

    crate::api::router()
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum::middleware::from_fn_with_state(
            audit_state,
            crate::auth::audit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found(uri: Uri) -> ApiError {
    not_found(uri.path())
}

fn cors_layer(origins: Option<&str>) -> anyhow::Result<Option<CorsLayer>> {
    let origins = match origins.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                HeaderName::from_static(TENANT_HEADER),
                HeaderName::from_static(PLAN_HEADER),
            ])
            .expose_headers([
                axum::http::header::CONTENT_DISPOSITION,
                HeaderName::from_static("x-content-sha256"),
                HeaderName::from_static("x-report-id"),
                HeaderName::from_static("x-error-code"),
            ]),
    ))
}
