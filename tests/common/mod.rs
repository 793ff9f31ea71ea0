//! Common test utilities and fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use gst_reconciler::auth::DEFAULT_MAX_BODY_BYTES;
use gst_reconciler::infra::{
    AuditLogEntry, AuditRepository, FallbackExplainer, InMemoryAuditLog, InMemoryTenantStore,
};
use gst_reconciler::server::{build_router, AppState};

pub const CSV_HEADER: &str = "gstin,invoice_no,invoice_date,taxable_value,cgst,sgst,igst";

pub const GSTIN_A: &str = "27AAAAA0000A1Z5";
pub const GSTIN_B: &str = "29BBBBB1111B1Z5";
pub const GSTIN_C: &str = "07CCCCC2222C1Z5";

/// Application under test plus a handle on its audit log
pub struct TestApp {
    pub router: Router,
    pub audit: Arc<InMemoryAuditLog>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_max_body_bytes(DEFAULT_MAX_BODY_BYTES)
    }

    pub fn with_max_body_bytes(max_body_bytes: usize) -> Self {
        let audit = Arc::new(InMemoryAuditLog::new());
        let state = AppState::new(
            Arc::new(InMemoryTenantStore::new()),
            audit.clone(),
            Arc::new(FallbackExplainer),
        );
        Self {
            router: build_router(state, max_body_bytes),
            audit,
        }
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.audit.get_all().unwrap()
    }

    pub fn last_audit(&self) -> AuditLogEntry {
        self.audit_entries().pop().expect("no audit entries")
    }

    /// Send a request and collect the full response.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .into_service::<Body>()
            .oneshot(request)
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn upload_csv(&self, tenant: &str, csv: &str) -> TestResponse {
        self.send(
            request(Method::POST, "/invoices/upload")
                .header("x-tenant-id", tenant)
                .header("content-type", "text/csv")
                .body(Body::from(csv.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, tenant: Option<&str>, uri: &str) -> TestResponse {
        let mut builder = request(Method::GET, uri);
        if let Some(tenant) = tenant {
            builder = builder.header("x-tenant-id", tenant);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        tenant: Option<&str>,
        uri: &str,
        body: serde_json::Value,
    ) -> TestResponse {
        let mut builder = request(Method::POST, uri).header("content-type", "application/json");
        if let Some(tenant) = tenant {
            builder = builder.header("x-tenant-id", tenant);
        }
        self.send(
            builder
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
    }
}

pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

/// Collected response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        if self.body.is_empty() {
            json!({})
        } else {
            serde_json::from_slice(&self.body)
                .unwrap_or_else(|_| json!({ "raw": String::from_utf8_lossy(&self.body) }))
        }
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// One CSV data row
pub fn csv_row(gstin: &str, invoice_no: &str, taxable: &str, cgst: &str, sgst: &str, igst: &str) -> String {
    format!("{gstin},{invoice_no},2024-01-15,{taxable},{cgst},{sgst},{igst}")
}

/// Header plus rows
pub fn csv(rows: &[String]) -> String {
    let mut out = String::from(CSV_HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out.push('\n');
    out
}

/// Risky, partial and matched rows at positions 0, 1 and 2. The first two
/// share a vendor.
pub fn three_row_batch() -> String {
    csv(&[
        csv_row(GSTIN_A, "INV-001", "12000", "1080", "1080", "0"),
        csv_row(GSTIN_A, "INV-002", "1000", "0", "0", "180"),
        csv_row(GSTIN_C, "INV-003", "1000", "90", "90", "0"),
    ])
}

/// `count` plain rows for one vendor
pub fn plain_batch(prefix: &str, count: usize) -> String {
    let rows: Vec<String> = (0..count)
        .map(|i| csv_row(GSTIN_C, &format!("{prefix}-{i:04}"), "500", "45", "45", "0"))
        .collect();
    csv(&rows)
}
