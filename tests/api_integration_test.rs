//! REST API integration tests for the GST reconciliation service.
//!
//! These tests drive the full router (audit middleware included) in process
//! with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use serde_json::json;

use gst_reconciler::crypto::{sha256_hex, EMPTY_SHA256_HEX};
use gst_reconciler::infra::{ActionType, AuditStatus};

use common::*;

// ============================================================================
// Tenant isolation & audit
// ============================================================================

#[tokio::test]
async fn test_missing_tenant_is_rejected_and_audited() {
    let app = TestApp::new();

    let response = app.get(None, "/reports/gst-risk").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "detail": "Missing tenant identifier" }));

    let entries = app.audit_entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.tenant_id, "MISSING");
    assert_eq!(entry.status, AuditStatus::Failure);
    assert_eq!(entry.action_type, ActionType::Report);
    assert!(entry.input_hash.is_none());
    assert!(entry.output_hash.is_none());
}

#[tokio::test]
async fn test_missing_tenant_upload_leaves_store_untouched() {
    let app = TestApp::new();

    let response = app
        .send(
            request(Method::POST, "/invoices/upload")
                .body(Body::from(three_row_batch()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let health = app.get(None, "/health").await;
    assert_eq!(health.json()["tenants"], 0);
}

#[tokio::test]
async fn test_public_health_without_tenant() {
    let app = TestApp::new();

    let response = app.get(None, "/health").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "gst-reconciler");
    assert_eq!(body["explainer"], "fallback");

    let entry = app.last_audit();
    assert_eq!(entry.tenant_id, "PUBLIC");
    assert_eq!(entry.action_type, ActionType::HealthCheck);
    assert_eq!(entry.status, AuditStatus::Success);
    assert_eq!(entry.input_hash.as_deref(), Some(EMPTY_SHA256_HEX));
    assert_eq!(entry.output_hash, Some(sha256_hex(&response.body)));
}

#[tokio::test]
async fn test_cookie_tenant_is_used() {
    let app = TestApp::new();

    let response = app
        .send(
            request(Method::POST, "/invoices/upload")
                .header("cookie", "gst_tenant_id=cookie-tenant")
                .header("x-tenant-id", "header-tenant")
                .body(Body::from(three_row_batch()))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["tenant_id"], "cookie-tenant");
    assert_eq!(app.last_audit().tenant_id, "cookie-tenant");

    let report = app.get(Some("cookie-tenant"), "/reports/gst-risk").await;
    assert_eq!(report.status, StatusCode::OK);
    let other = app.get(Some("header-tenant"), "/reports/gst-risk").await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_audited_as_failure() {
    let app = TestApp::new();

    let response = app.get(Some("acme"), "/does-not-exist").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.header("x-error-code"), "RESOURCE_NOT_FOUND");
    let entry = app.last_audit();
    assert_eq!(entry.action_type, ActionType::Unknown);
    assert_eq!(entry.status, AuditStatus::Failure);
    assert_eq!(entry.tenant_id, "acme");
}

#[tokio::test]
async fn test_oversized_body_rejected_before_handler() {
    let app = TestApp::with_max_body_bytes(256);
    let body = plain_batch("BIG", 20);
    assert!(body.len() > 256);

    let response = app.upload_csv("acme", &body).await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    let entry = app.last_audit();
    assert_eq!(entry.status, AuditStatus::Failure);
    assert!(entry.input_hash.is_none());

    let report = app.get(Some("acme"), "/reports/gst-risk").await;
    assert_eq!(report.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_one_audit_entry_per_request() {
    let app = TestApp::new();

    app.upload_csv("acme", &three_row_batch()).await;
    app.get(Some("acme"), "/reports/gst-risk").await;
    app.get(None, "/reports/gst-risk").await;
    app.get(None, "/health").await;

    let actions: Vec<ActionType> = app.audit_entries().iter().map(|e| e.action_type).collect();
    assert_eq!(
        actions,
        vec![
            ActionType::Upload,
            ActionType::Report,
            ActionType::Report,
            ActionType::HealthCheck
        ]
    );
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn test_three_row_batch_classification() {
    let app = TestApp::new();
    let csv = three_row_batch();

    let response = app.upload_csv("acme", &csv).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["tenant_id"], "acme");
    assert_eq!(body["plan"], "BASIC");
    assert_eq!(body["total_invoices"], 3);

    let statuses: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["RISKY_ITC", "PARTIAL_MATCH", "MATCHED"]);

    let vendors = body["vendor_summary"].as_array().unwrap();
    assert_eq!(vendors.len(), 2);
    assert_eq!(vendors[0]["vendor_gstin"], GSTIN_A);
    assert_eq!(vendors[0]["vendor_risk_level"], "HIGH");
    assert_eq!(vendors[0]["total_invoices"], 2);
    assert_eq!(vendors[0]["risky_count"], 1);
    assert_eq!(vendors[1]["vendor_gstin"], GSTIN_C);
    assert_eq!(vendors[1]["vendor_risk_level"], "LOW");

    let entry = app.last_audit();
    assert_eq!(entry.action_type, ActionType::Upload);
    assert_eq!(entry.status, AuditStatus::Success);
    assert_eq!(entry.input_hash, Some(sha256_hex(csv.as_bytes())));
    assert_eq!(entry.output_hash, Some(sha256_hex(&response.body)));
}

#[tokio::test]
async fn test_reconcile_json_matches_csv_pipeline() {
    let app = TestApp::new();

    let response = app
        .post_json(
            Some("acme"),
            "/reconcile",
            json!({
                "invoices": [
                    {
                        "gstin": GSTIN_A,
                        "invoice_number": "INV-100",
                        "invoice_date": "2024-03-01",
                        "taxable_value": 15000,
                        "cgst": 1350,
                        "sgst": 1350,
                        "igst": 0
                    },
                    {
                        "gstin": GSTIN_A,
                        "invoice_no": "INV-101",
                        "invoice_date": "2024-03-02",
                        "taxable_value": "100.50",
                        "cgst": "9.05",
                        "sgst": "9.05",
                        "igst": "0"
                    }
                ]
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["total_invoices"], 2);
    assert_eq!(body["results"][0]["status"], "RISKY_ITC");
    assert_eq!(body["results"][1]["status"], "MATCHED");
    assert_eq!(app.last_audit().action_type, ActionType::Reconcile);
}

#[tokio::test]
async fn test_validation_errors_are_reported_per_row() {
    let app = TestApp::new();
    let csv = csv(&[
        csv_row(GSTIN_A, "INV-1", "100", "9", "9", "0"),
        csv_row("BADGSTIN", "INV-2", "100", "9", "9", "0"),
        csv_row(GSTIN_A, "INV-3", "abc", "9", "9", "-1"),
    ]);

    let response = app.upload_csv("acme", &csv).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["code"], "VALIDATION_FAILED");
    let rows: Vec<u64> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["row"].as_u64().unwrap())
        .collect();
    assert!(rows.contains(&2));
    assert!(rows.contains(&3));
    assert!(!rows.contains(&1));

    let report = app.get(Some("acme"), "/reports/gst-risk").await;
    assert_eq!(report.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_columns() {
    let app = TestApp::new();
    let csv = "gstin,invoice_no,invoice_date,taxable_value,cgst,sgst\n27AAAAA0000A1Z5,INV-1,2024-01-01,100,9,9\n";

    let response = app.upload_csv("acme", csv).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["code"], "MISSING_COLUMNS");
    assert_eq!(body["detail"], "Missing required columns: igst");
}

#[tokio::test]
async fn test_invalid_encoding() {
    let app = TestApp::new();

    let response = app
        .send(
            request(Method::POST, "/invoices/upload")
                .header("x-tenant-id", "acme")
                .body(Body::from(vec![0xff, 0xfe, 0x00, 0x41]))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "INVALID_ENCODING");
}

#[tokio::test]
async fn test_plan_limit_is_enforced() {
    let app = TestApp::new();

    let response = app.upload_csv("acme", &plain_batch("INV", 101)).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    let body = response.json();
    assert_eq!(body["code"], "PLAN_LIMIT_EXCEEDED");
    assert_eq!(
        body["detail"],
        "Invoice limit exceeded for your current plan (BASIC). Limit: 100, Uploaded: 101"
    );

    let response = app
        .send(
            request(Method::POST, "/invoices/upload")
                .header("x-tenant-id", "acme")
                .header("x-plan", "PRO")
                .body(Body::from(plain_batch("INV", 101)))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["plan"], "PRO");
}

#[tokio::test]
async fn test_invalid_plan() {
    let app = TestApp::new();

    let response = app
        .send(
            request(Method::POST, "/invoices/upload")
                .header("x-tenant-id", "acme")
                .header("x-plan", "GOLD")
                .body(Body::from(three_row_batch()))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "INVALID_PLAN");
    assert_eq!(response.header("x-error-code"), "INVALID_PLAN");
}

// ============================================================================
// Reporting
// ============================================================================

#[tokio::test]
async fn test_report_without_upload_is_404() {
    let app = TestApp::new();

    let response = app.get(Some("fresh-tenant"), "/reports/gst-risk").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.json()["detail"].is_string());
    assert_eq!(app.last_audit().status, AuditStatus::Failure);

    let pdf = app.get(Some("fresh-tenant"), "/reports/gst-risk/pdf").await;
    assert_eq!(pdf.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_upload_replaces_first() {
    let app = TestApp::new();

    app.upload_csv("acme", &plain_batch("OLD", 4)).await;
    let response = app.upload_csv("acme", &plain_batch("NEW", 2)).await;
    assert_eq!(response.status, StatusCode::OK);

    let report = app.get(Some("acme"), "/reports/gst-risk").await.json();
    assert_eq!(report["summary"]["total_invoices"], 2);

    let numbers: Vec<&str> = report["invoice_details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["invoice_number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["NEW-0000", "NEW-0001"]);
}

#[tokio::test]
async fn test_report_contents() {
    let app = TestApp::new();
    app.upload_csv("acme", &three_row_batch()).await;

    let response = app.get(Some("acme"), "/reports/gst-risk").await;

    assert_eq!(response.status, StatusCode::OK);
    let report = response.json();
    assert_eq!(report["business"]["tenant_id"], "acme");
    assert_eq!(report["business"]["gstin"], GSTIN_A);
    assert_eq!(report["summary"]["risky_itc_count"], 1);
    assert_eq!(report["summary"]["partial_match_count"], 1);
    assert_eq!(report["summary"]["matched_count"], 1);
    assert_eq!(report["summary"]["risky_itc_amount"], 2160.0);
    assert_eq!(report["audit"]["reconciliation_version"], "1.0.0");
    assert_eq!(
        report["audit"]["data_sources"],
        json!(["User_Upload", "Government_Portal_Mock"])
    );

    // Same stored batch, same report id.
    let again = app.get(Some("acme"), "/reports/gst-risk").await.json();
    assert_eq!(report["audit"]["report_id"], again["audit"]["report_id"]);
}

#[tokio::test]
async fn test_pdf_download() {
    let app = TestApp::new();
    app.upload_csv("acme-industries", &three_row_batch()).await;

    let response = app.get(Some("acme-industries"), "/reports/gst-risk/pdf").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"GST_Trust_Report_acme-ind.pdf\""
    );
    assert!(response.body.starts_with(b"%PDF-1.4"));

    let digest = sha256_hex(&response.body);
    assert_eq!(response.header("x-content-sha256"), digest);

    let entry = app.last_audit();
    assert_eq!(entry.action_type, ActionType::PdfDownload);
    assert_eq!(entry.status, AuditStatus::Success);
    assert_eq!(entry.output_hash, Some(digest.clone()));

    // Deterministic for the same stored batch.
    let again = app.get(Some("acme-industries"), "/reports/gst-risk/pdf").await;
    assert_eq!(again.body, response.body);
    assert_eq!(again.header("x-content-sha256"), digest);
    assert_eq!(again.header("x-report-id"), response.header("x-report-id"));
}

// ============================================================================
// Explanation & audit listing
// ============================================================================

#[tokio::test]
async fn test_explain_mismatch_echoes_status() {
    let app = TestApp::new();

    let response = app
        .post_json(
            Some("acme"),
            "/explain-mismatch",
            json!({
                "invoice_number": "INV-002",
                "gstin": GSTIN_B,
                "status": "PARTIAL_MATCH",
                "factual_diffs": { "cgst": { "books": 90, "portal": 0 } }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["original_status"], "PARTIAL_MATCH");
    assert_eq!(
        body["explanation"],
        "Automated explanation unavailable. Please review manually."
    );
    assert_eq!(body["root_cause"], "System Limitation");
    assert_eq!(body["suggested_action"], "Manual Review");
    assert_eq!(app.last_audit().action_type, ActionType::Explain);
}

#[tokio::test]
async fn test_explain_rejects_malformed_body() {
    let app = TestApp::new();

    let response = app
        .post_json(Some("acme"), "/explain-mismatch", json!({ "status": "SOMETHING" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "INVALID_REQUEST_BODY");
}

#[tokio::test]
async fn test_audit_logs_are_tenant_scoped() {
    let app = TestApp::new();
    app.upload_csv("tenant-a", &three_row_batch()).await;
    app.upload_csv("tenant-b", &three_row_batch()).await;
    app.get(Some("tenant-a"), "/reports/gst-risk").await;

    let response = app.get(Some("tenant-a"), "/audit/logs").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["tenant_id"], "tenant-a");
    assert_eq!(body["count"], 2);
    let entries = body["entries"].as_array().unwrap();
    assert!(entries.iter().all(|e| e["tenant_id"] == "tenant-a"));
    assert_eq!(entries[0]["action_type"], "UPLOAD");
    assert_eq!(entries[1]["action_type"], "REPORT");

    let filtered = app
        .get(Some("tenant-a"), "/audit/logs?action_type=REPORT&limit=5")
        .await
        .json();
    assert_eq!(filtered["count"], 1);
}
