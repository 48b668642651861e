use crate::adapters::ReportStore;
use crate::errors::AppResult;
use crate::models::{NamedQuery, ReportFilter};
use std::sync::Mutex;

/// Read-through cache of every known named query, in store listing order.
///
/// The lock is never held across a store call; a concurrent fill simply
/// overwrites the slot with an equally fresh listing.
#[derive(Debug, Default)]
pub struct ReportCache {
    entries: Mutex<Option<Vec<NamedQuery>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self, store: &dyn ReportStore) -> AppResult<Vec<NamedQuery>> {
        if let Some(cached) = self.snapshot() {
            return Ok(cached);
        }

        let fresh = store.list_reports(&ReportFilter::default()).await?;
        if let Ok(mut guard) = self.entries.lock() {
            *guard = Some(fresh.clone());
        }
        Ok(fresh)
    }

    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.entries.lock() {
            *guard = None;
        }
    }

    pub fn is_warm(&self) -> bool {
        self.snapshot().is_some()
    }

    fn snapshot(&self) -> Option<Vec<NamedQuery>> {
        self.entries.lock().ok().and_then(|guard| guard.clone())
    }
}
