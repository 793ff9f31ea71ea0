//! Batch ingestion: parse, validate, classify, aggregate, store.
//!
//! A batch is either fully accepted and replaces the tenant's record, or
//! rejected with no effect on the store. The record is built completely before
//! the single `put`.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    FieldError, Invoice, PlanTier, RawInvoice, TenantId, TenantRecord, REQUIRED_COLUMNS,
};

use super::{aggregate, classify_batch, PipelineError, Result, TenantStore};

/// Turns uploaded invoice batches into tenant records.
pub struct IngestService {
    store: Arc<dyn TenantStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    /// Ingest a CSV upload.
    pub fn ingest_csv(
        &self,
        tenant_id: &TenantId,
        plan: PlanTier,
        body: &[u8],
    ) -> Result<Arc<TenantRecord>> {
        let rows = parse_csv(body, plan)?;
        self.ingest_rows(tenant_id, plan, rows)
    }

    /// Ingest already-decoded rows (JSON reconcile requests and parsed CSV).
    pub fn ingest_rows(
        &self,
        tenant_id: &TenantId,
        plan: PlanTier,
        rows: Vec<RawInvoice>,
    ) -> Result<Arc<TenantRecord>> {
        check_limit(plan, rows.len())?;
        let invoices = validate_rows(&rows)?;

        let results = classify_batch(&invoices);
        let vendor_summary = aggregate(&invoices, &results)?;

        let record = Arc::new(TenantRecord {
            tenant_id: tenant_id.clone(),
            plan,
            invoices,
            results,
            vendor_summary,
            ingested_at: Utc::now(),
        });
        self.store.put(record.clone())?;

        tracing::info!(
            tenant_id = %tenant_id,
            plan = %plan,
            invoices = record.invoices.len(),
            vendors = record.vendor_summary.len(),
            "Processed invoice batch"
        );
        Ok(record)
    }
}

fn check_limit(plan: PlanTier, actual: usize) -> Result<()> {
    let limit = plan.row_limit();
    if actual > limit {
        return Err(PipelineError::LimitExceeded {
            plan,
            limit,
            actual,
        });
    }
    Ok(())
}

/// Decode a CSV upload into raw rows.
///
/// Order of checks: encoding, CSV structure, plan limit, required columns.
/// Header names and cells are trimmed; unknown columns are ignored.
pub fn parse_csv(body: &[u8], plan: PlanTier) -> Result<Vec<RawInvoice>> {
    let text = std::str::from_utf8(body).map_err(|_| PipelineError::InvalidEncoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    check_limit(plan, records.len())?;

    let column = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| column(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns(missing));
    }

    let source_column = column("source");
    let cell = |record: &csv::StringRecord, name: &str| {
        column(name)
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    };

    Ok(records
        .iter()
        .map(|record| RawInvoice {
            gstin: cell(record, "gstin"),
            invoice_no: cell(record, "invoice_no"),
            invoice_date: cell(record, "invoice_date"),
            taxable_value: cell(record, "taxable_value"),
            cgst: cell(record, "cgst"),
            sgst: cell(record, "sgst"),
            igst: cell(record, "igst"),
            source: source_column
                .and_then(|i| record.get(i))
                .map(str::to_string),
        })
        .collect())
}

/// Validate every row, collecting all field errors across the batch.
pub fn validate_rows(rows: &[RawInvoice]) -> Result<Vec<Invoice>> {
    let mut invoices = Vec::with_capacity(rows.len());
    let mut errors: Vec<FieldError> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        match row.validate(i + 1) {
            Ok(invoice) => invoices.push(invoice),
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    if errors.is_empty() {
        Ok(invoices)
    } else {
        Err(PipelineError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReconciliationStatus;
    use crate::infra::{InMemoryTenantStore, MockTenantStore};

    const HEADER: &str = "gstin,invoice_no,invoice_date,taxable_value,cgst,sgst,igst";

    fn csv_with_rows(rows: usize) -> String {
        let mut body = format!("{HEADER}\n");
        for i in 0..rows {
            body.push_str(&format!("27AAAAA0000A1Z5,INV-{i},2024-01-01,1000,90,90,0\n"));
        }
        body
    }

    #[test]
    fn test_parse_trims_cells_and_headers() {
        let body = " gstin , invoice_no,invoice_date,taxable_value,cgst,sgst,igst,source\n\
                    27AAAAA0000A1Z5 , INV-1 ,2024-01-01, 1000 ,90,90,0, gstr2b \n";
        let rows = parse_csv(body.as_bytes(), PlanTier::Basic).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].gstin, "27AAAAA0000A1Z5");
        assert_eq!(rows[0].invoice_no, "INV-1");
        assert_eq!(rows[0].taxable_value, "1000");
        assert_eq!(rows[0].source.as_deref(), Some("gstr2b"));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_csv(&[0xff, 0xfe, 0x00], PlanTier::Basic).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidEncoding));
    }

    #[test]
    fn test_limit_checked_before_columns() {
        let mut body = "gstin\n".to_string();
        for _ in 0..101 {
            body.push_str("27AAAAA0000A1Z5\n");
        }
        let err = parse_csv(body.as_bytes(), PlanTier::Basic).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::LimitExceeded {
                limit: 100,
                actual: 101,
                ..
            }
        ));
    }

    #[test]
    fn test_plan_caps() {
        assert!(parse_csv(csv_with_rows(100).as_bytes(), PlanTier::Basic).is_ok());
        assert!(parse_csv(csv_with_rows(101).as_bytes(), PlanTier::Basic).is_err());
        assert!(parse_csv(csv_with_rows(101).as_bytes(), PlanTier::Pro).is_ok());
    }

    #[test]
    fn test_missing_columns_listed_in_order() {
        let body = "gstin,invoice_no,invoice_date,taxable_value\n";
        let err = parse_csv(body.as_bytes(), PlanTier::Basic).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => assert_eq!(cols, vec!["cgst", "sgst", "igst"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let body = format!("{HEADER}\n27AAAAA0000A1Z5,INV-1\n");
        let err = parse_csv(body.as_bytes(), PlanTier::Basic).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedCsv(_)));
    }

    #[test]
    fn test_validation_errors_span_rows() {
        let body = format!(
            "{HEADER}\n\
             BAD,INV-1,2024-01-01,1000,90,90,0\n\
             27AAAAA0000A1Z5,INV-2,2024-01-01,1000,90,90,0\n\
             27AAAAA0000A1Z5,INV-3,01-01-2024,1000,x,90,0\n"
        );
        let rows = parse_csv(body.as_bytes(), PlanTier::Basic).unwrap();
        match validate_rows(&rows).unwrap_err() {
            PipelineError::Validation(errors) => {
                let rows: Vec<usize> = errors.iter().map(|e| e.row).collect();
                assert_eq!(rows, vec![1, 3, 3]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ingest_stores_complete_record() {
        let store = Arc::new(InMemoryTenantStore::new());
        let service = IngestService::new(store.clone());
        let tenant = TenantId::parse("acme").unwrap();

        let body = format!(
            "{HEADER}\n\
             27AAAAA0000A1Z5,INV-1,2024-01-01,1000,90,90,0\n\
             27AAAAA0000A1Z5,INV-2,2024-01-02,20000,0,0,3600\n\
             29BBBBB1111B1Z5,INV-3,2024-01-03,500,45,45,0\n"
        );
        let record = service
            .ingest_csv(&tenant, PlanTier::Basic, body.as_bytes())
            .unwrap();

        assert_eq!(record.invoices.len(), 3);
        assert_eq!(record.results.len(), 3);
        assert_eq!(record.results[0].status, ReconciliationStatus::MissingIn2b);
        assert_eq!(record.results[1].status, ReconciliationStatus::RiskyItc);
        assert_eq!(record.results[2].status, ReconciliationStatus::Matched);
        assert_eq!(record.vendor_summary.len(), 2);

        let stored = store.get(&tenant).unwrap().unwrap();
        assert!(Arc::ptr_eq(&stored, &record));
    }

    #[test]
    fn test_rejected_batch_never_touches_store() {
        let mut store = MockTenantStore::new();
        store.expect_put().never();
        let service = IngestService::new(Arc::new(store));
        let tenant = TenantId::parse("acme").unwrap();

        let body = format!("{HEADER}\n27AAAAA0000A1Z5,INV-1,2024-01-01,-5,90,90,0\n");
        assert!(service
            .ingest_csv(&tenant, PlanTier::Basic, body.as_bytes())
            .is_err());
        assert!(service
            .ingest_csv(&tenant, PlanTier::Basic, csv_with_rows(101).as_bytes())
            .is_err());
    }

    #[test]
    fn test_storage_failure_propagates() {
        let mut store = MockTenantStore::new();
        store
            .expect_put()
            .times(1)
            .returning(|_| Err(PipelineError::Storage("down".to_string())));
        let service = IngestService::new(Arc::new(store));
        let tenant = TenantId::parse("acme").unwrap();

        let err = service
            .ingest_csv(&tenant, PlanTier::Basic, csv_with_rows(1).as_bytes())
            .unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
    }

    #[test]
    fn test_header_only_upload_is_an_empty_batch() {
        let store = Arc::new(InMemoryTenantStore::new());
        let service = IngestService::new(store);
        let tenant = TenantId::parse("acme").unwrap();

        let record = service
            .ingest_csv(&tenant, PlanTier::Basic, format!("{HEADER}\n").as_bytes())
            .unwrap();
        assert!(record.invoices.is_empty());
        assert!(record.vendor_summary.is_empty());
    }
}
