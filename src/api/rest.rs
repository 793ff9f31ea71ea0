//! REST API routes.

use axum::routing::{get, post};
use axum::Router;

use crate::api::handlers::{
    explain_mismatch, gst_risk_report, gst_risk_report_pdf, health_check, list_audit_logs,
    reconcile_invoices, upload_invoices,
};
use crate::server::AppState;

/// Build the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        // Ingestion
        .route("/invoices/upload", post(upload_invoices))
        .route("/reconcile", post(reconcile_invoices))
        // Reporting
        .route("/reports/gst-risk", get(gst_risk_report))
        .route("/reports/gst-risk/pdf", get(gst_risk_report_pdf))
        // Explanation
        .route("/explain-mismatch", post(explain_mismatch))
        // Audit trail
        .route("/audit/logs", get(list_audit_logs))
}
