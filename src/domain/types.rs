//! Core identifier types for the reconciliation pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tenant value recorded in the audit trail when a request carries no tenant identity.
pub const TENANT_MISSING: &str = "MISSING";

/// Tenant value recorded in the audit trail for public routes without tenant identity.
pub const TENANT_PUBLIC: &str = "PUBLIC";

static GSTIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$")
        .expect("GSTIN pattern is a valid regex")
});

/// Tenant identifier
///
/// Opaque, caller-supplied string. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Parse a raw carrier value. Blank values are treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename-safe prefix of the identifier.
    pub fn short_prefix(&self, len: usize) -> String {
        self.0
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(len)
            .collect()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 15-character GST registration number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gstin(String);

impl Gstin {
    pub fn parse(raw: &str) -> Option<Self> {
        if GSTIN_PATTERN.is_match(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Gstin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Subscription tier bounding the number of rows per upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    #[default]
    Basic,
    Pro,
    Enterprise,
}

impl PlanTier {
    /// Maximum invoice rows accepted in a single batch.
    pub fn row_limit(&self) -> usize {
        match self {
            PlanTier::Basic => 100,
            PlanTier::Pro => 500,
            PlanTier::Enterprise => 1000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "BASIC",
            PlanTier::Pro => "PRO",
            PlanTier::Enterprise => "ENTERPRISE",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BASIC" => Ok(PlanTier::Basic),
            "PRO" => Ok(PlanTier::Pro),
            "ENTERPRISE" => Ok(PlanTier::Enterprise),
            other => Err(format!(
                "Invalid plan '{other}'. Allowed: BASIC, PRO, ENTERPRISE"
            )),
        }
    }
}
