//! Audit logging for every HTTP request
//!
//! Provides the append-only request trail written by the audit middleware:
//! - Action classification by request path
//! - Request/response body digests
//! - Tenant attribution (including the MISSING/PUBLIC sentinels)
//! - Outcome derived from the response status

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::AuditRepository;

/// Audit log action types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Upload,
    Reconcile,
    Report,
    PdfDownload,
    Explain,
    HealthCheck,
    Unknown,
}

impl ActionType {
    /// Classify a request path. First match wins.
    pub fn from_path(path: &str) -> Self {
        if path.contains("upload") {
            ActionType::Upload
        } else if path.contains("reconcile") {
            ActionType::Reconcile
        } else if path.contains("explain") {
            ActionType::Explain
        } else if path.contains("health") {
            ActionType::HealthCheck
        } else if path.contains("reports") {
            if path.ends_with("/pdf") {
                ActionType::PdfDownload
            } else {
                ActionType::Report
            }
        } else {
            ActionType::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Upload => "UPLOAD",
            ActionType::Reconcile => "RECONCILE",
            ActionType::Report => "REPORT",
            ActionType::PdfDownload => "PDF_DOWNLOAD",
            ActionType::Explain => "EXPLAIN",
            ActionType::HealthCheck => "HEALTH_CHECK",
            ActionType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UPLOAD" => Ok(ActionType::Upload),
            "RECONCILE" => Ok(ActionType::Reconcile),
            "REPORT" => Ok(ActionType::Report),
            "PDF_DOWNLOAD" => Ok(ActionType::PdfDownload),
            "EXPLAIN" => Ok(ActionType::Explain),
            "HEALTH_CHECK" => Ok(ActionType::HealthCheck),
            "UNKNOWN" => Ok(ActionType::Unknown),
            other => Err(format!("unknown action type '{other}'")),
        }
    }
}

/// Request outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    /// SUCCESS iff the status is 2xx.
    pub fn from_http_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            AuditStatus::Success
        } else {
            AuditStatus::Failure
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Success => f.write_str("SUCCESS"),
            AuditStatus::Failure => f.write_str("FAILURE"),
        }
    }
}

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique audit log ID
    pub event_id: Uuid,
    /// When the request finished
    pub timestamp: DateTime<Utc>,
    /// Request path
    pub endpoint: String,
    /// HTTP method
    pub method: String,
    pub action_type: ActionType,
    pub actor: String,
    /// Tenant ID, or the MISSING/PUBLIC sentinel
    pub tenant_id: String,
    /// SHA-256 hex of the request body as received
    pub input_hash: Option<String>,
    /// SHA-256 hex of the response body as sent
    pub output_hash: Option<String>,
    pub status: AuditStatus,
}

/// Builder for creating audit log entries
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
    endpoint: String,
    method: String,
    action_type: ActionType,
    actor: String,
    tenant_id: String,
    input_hash: Option<String>,
    output_hash: Option<String>,
    status: AuditStatus,
}

impl AuditLogBuilder {
    /// Start an entry for a request; the action type is derived from the path.
    ///
    /// Entries start out as FAILURE and only become SUCCESS once a 2xx
    /// response has been observed.
    pub fn new(endpoint: impl Into<String>, method: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            action_type: ActionType::from_path(&endpoint),
            endpoint,
            method: method.into(),
            actor: "system".to_string(),
            tenant_id: crate::domain::TENANT_MISSING.to_string(),
            input_hash: None,
            output_hash: None,
            status: AuditStatus::Failure,
        }
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn input_hash(mut self, hash: impl Into<String>) -> Self {
        self.input_hash = Some(hash.into());
        self
    }

    pub fn output_hash(mut self, hash: impl Into<String>) -> Self {
        self.output_hash = Some(hash.into());
        self
    }

    /// Record the outcome from the final HTTP status code
    pub fn http_status(mut self, status: u16) -> Self {
        self.status = AuditStatus::from_http_status(status);
        self
    }

    /// Build the audit log entry
    pub fn build(self) -> AuditLogEntry {
        AuditLogEntry {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            endpoint: self.endpoint,
            method: self.method,
            action_type: self.action_type,
            actor: self.actor,
            tenant_id: self.tenant_id,
            input_hash: self.input_hash,
            output_hash: self.output_hash,
            status: self.status,
        }
    }
}

/// Audit log failures. Never surfaced to clients.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit log lock poisoned")]
    Poisoned,
}

/// Query filters for audit logs
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditQueryFilters {
    pub action_type: Option<ActionType>,
    pub status: Option<AuditStatus>,
    /// Keep only the newest `limit` entries
    pub limit: Option<usize>,
}

impl AuditQueryFilters {
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        self.action_type.map_or(true, |a| a == entry.action_type)
            && self.status.map_or(true, |s| s == entry.status)
    }
}

/// Process-local append-only audit log
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditRepository for InMemoryAuditLog {
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        // Also emit a tracing event
        match entry.status {
            AuditStatus::Success => tracing::info!(
                event_id = %entry.event_id,
                action = %entry.action_type,
                method = %entry.method,
                endpoint = %entry.endpoint,
                tenant_id = %entry.tenant_id,
                "Audit log entry"
            ),
            AuditStatus::Failure => tracing::warn!(
                event_id = %entry.event_id,
                action = %entry.action_type,
                method = %entry.method,
                endpoint = %entry.endpoint,
                tenant_id = %entry.tenant_id,
                "Audit log entry (failed)"
            ),
        }

        self.entries
            .lock()
            .map_err(|_| AuditError::Poisoned)?
            .push(entry);
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<AuditLogEntry>, AuditError> {
        Ok(self
            .entries
            .lock()
            .map_err(|_| AuditError::Poisoned)?
            .clone())
    }
}
