//! Invoice records and row-level validation.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::Gstin;

static NUMERIC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric pattern is a valid regex"));

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is a valid regex"));

/// Columns every upload must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "gstin",
    "invoice_no",
    "invoice_date",
    "taxable_value",
    "cgst",
    "sgst",
    "igst",
];

fn default_source() -> String {
    "customer".to_string()
}

/// A validated tax invoice. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub gstin: Gstin,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub taxable_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub igst: Decimal,
    #[serde(default = "default_source")]
    pub source: String,
}

impl Invoice {
    /// Claimable input tax credit: the sum of the three tax components.
    pub fn itc_amount(&self) -> Decimal {
        self.cgst + self.sgst + self.igst
    }
}

/// An offending field within an ingested batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// 1-based position among data rows. The CSV header is not counted, so
    /// row 1 is the first line after the header (line 2 of the file) and the
    /// first element of a JSON `invoices` array.
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(row: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row {}: {}: {}", self.row, self.field, self.message)
    }
}

/// Unvalidated invoice row as it arrives from CSV or JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawInvoice {
    #[serde(default, deserialize_with = "string_or_number")]
    pub gstin: String,
    #[serde(default, alias = "invoice_number", deserialize_with = "string_or_number")]
    pub invoice_no: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub invoice_date: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub taxable_value: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub cgst: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub sgst: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub igst: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl RawInvoice {
    /// Validate every field, collecting all problems for the row.
    pub fn validate(&self, row: usize) -> Result<Invoice, Vec<FieldError>> {
        let mut errors = Vec::new();

        let gstin = match self.gstin.trim() {
            "" => {
                errors.push(FieldError::new(row, "gstin", "field required"));
                None
            }
            raw => {
                let parsed = Gstin::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new(row, "gstin", "Invalid GSTIN format"));
                }
                parsed
            }
        };

        let invoice_number = self.invoice_no.trim();
        if invoice_number.is_empty() {
            errors.push(FieldError::new(row, "invoice_no", "field required"));
        }

        let invoice_date = parse_date(self.invoice_date.trim());
        if invoice_date.is_none() {
            errors.push(FieldError::new(
                row,
                "invoice_date",
                "Date must be in YYYY-MM-DD format",
            ));
        }

        let taxable_value = parse_amount(row, "taxable_value", &self.taxable_value, &mut errors);
        let cgst = parse_amount(row, "cgst", &self.cgst, &mut errors);
        let sgst = parse_amount(row, "sgst", &self.sgst, &mut errors);
        let igst = parse_amount(row, "igst", &self.igst, &mut errors);

        match (gstin, invoice_date, taxable_value, cgst, sgst, igst) {
            (Some(gstin), Some(invoice_date), Some(taxable_value), Some(cgst), Some(sgst), Some(igst))
                if errors.is_empty() =>
            {
                Ok(Invoice {
                    gstin,
                    invoice_number: invoice_number.to_string(),
                    invoice_date,
                    taxable_value,
                    cgst,
                    sgst,
                    igst,
                    source: self
                        .source
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(default_source),
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_amount(row: usize, field: &str, raw: &str, errors: &mut Vec<FieldError>) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(row, field, "field required"));
        return None;
    }
    if !NUMERIC_PATTERN.is_match(raw) {
        errors.push(FieldError::new(
            row,
            field,
            format!("{field} must be strictly numeric"),
        ));
        return None;
    }
    match Decimal::from_str(raw) {
        Ok(value) if value.is_sign_negative() && !value.is_zero() => {
            errors.push(FieldError::new(
                row,
                field,
                format!("{field} must be non-negative"),
            ));
            None
        }
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(FieldError::new(row, field, format!("{field} is out of range")));
            None
        }
    }
}

/// Accepts JSON strings and numbers alike; numbers are kept in their textual form.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
