//! GST Reconciler Library
//!
//! Tenant-isolated GST invoice reconciliation: batch ingestion, rule-based
//! classification against a simulated external ledger, vendor risk
//! aggregation, and JSON/PDF compliance reports, all behind an audited
//! request pipeline.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (invoices, outcomes, vendor risk, reports)
//! - [`infra`] - Infrastructure implementations (store, engine, audit log)
//! - [`auth`] - Tenant identification and audit middleware
//! - [`crypto`] - SHA-256 helpers
//! - [`report`] - Report synthesis and PDF rendering
//! - [`telemetry`] - Structured logging setup
//! - [`api`] - REST API routes
//! - [`server`] - Configuration and bootstrap

pub mod api;
pub mod auth;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod report;
pub mod server;
pub mod telemetry;

// Re-export commonly used types
pub use domain::{
    GstRiskReport, Gstin, Invoice, PlanTier, RawInvoice, ReconciliationResult,
    ReconciliationStatus, TenantId, TenantRecord, VendorRiskLevel, VendorRiskSummary,
};

pub use infra::{IngestService, PipelineError, Result, TenantStore};
