//! In-memory tenant state store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::{TenantId, TenantRecord};

use super::{PipelineError, Result, TenantStore};

/// Process-local store holding the latest batch per tenant.
///
/// Records are kept behind `Arc` so a replacement is a single pointer swap
/// under the write lock and readers keep whatever view they already hold.
#[derive(Default)]
pub struct InMemoryTenantStore {
    records: RwLock<HashMap<TenantId, Arc<TenantRecord>>>,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenantStore for InMemoryTenantStore {
    fn put(&self, record: Arc<TenantRecord>) -> Result<()> {
        let tenant_id = record.tenant_id.clone();
        let invoices = record.invoices.len();

        let mut records = self
            .records
            .write()
            .map_err(|_| PipelineError::Storage("tenant store lock poisoned".to_string()))?;
        let replaced = records.insert(tenant_id.clone(), record).is_some();
        drop(records);

        tracing::debug!(
            tenant_id = %tenant_id,
            invoices,
            replaced,
            "Stored tenant batch"
        );
        Ok(())
    }

    fn get(&self, tenant_id: &TenantId) -> Result<Option<Arc<TenantRecord>>> {
        let records = self
            .records
            .read()
            .map_err(|_| PipelineError::Storage("tenant store lock poisoned".to_string()))?;
        Ok(records.get(tenant_id).cloned())
    }

    fn tenant_count(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| PipelineError::Storage("tenant store lock poisoned".to_string()))?;
        Ok(records.len())
    }
}
