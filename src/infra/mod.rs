//! Infrastructure layer for the GST reconciliation service
//!
//! Contains trait definitions and implementations for:
//! - Tenant state (in-memory, whole-record replacement)
//! - Reconciliation engine (rule-based classification)
//! - Vendor risk aggregation
//! - Batch ingestion (CSV/JSON parse, validation, store write)
//! - Audit logging (append-only request trail)
//! - Mismatch explanations (live endpoint with fallback)
//! - Graceful shutdown signalling

mod audit;
mod error;
mod explanation;
mod graceful_shutdown;
mod ingest;
mod reconciliation;
mod tenant_store;
mod traits;
mod vendor_risk;

pub use audit::{
    ActionType, AuditError, AuditLogBuilder, AuditLogEntry, AuditQueryFilters, AuditStatus,
    InMemoryAuditLog,
};
pub use error::*;
pub use explanation::{
    explainer_from_config, fallback_response, ExplainerConfig, FallbackExplainer, LiveExplainer,
    DEFAULT_EXPLAIN_API_URL, DEFAULT_EXPLAIN_MODEL, DEFAULT_EXPLAIN_TIMEOUT,
};
pub use graceful_shutdown::{shutdown_on, shutdown_signal};
pub use ingest::{parse_csv, validate_rows, IngestService};
pub use reconciliation::{classify, classify_batch, HIGH_VALUE_THRESHOLD, MISSING_POSITION_MODULUS};
pub use tenant_store::InMemoryTenantStore;
pub use traits::*;
pub use vendor_risk::aggregate;
