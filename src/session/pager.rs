use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::{error::AppResult, models::CatalogRecord, services::RecordResolver};

/// Observable state of the pager's fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PagerStatus {
    Idle,
    InFlight,
}

/// Clears the loading flag when the fetch scope ends, however it ends
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Incrementally loads catalog pages into an append-only list
pub struct CatalogPager {
    resolver: Arc<RecordResolver>,
    records: RwLock<Vec<CatalogRecord>>,
    next_page: AtomicU32,
    loading: AtomicBool,
}

impl CatalogPager {
    /// Fetches page 1 and positions the cursor on page 2
    pub async fn start(resolver: Arc<RecordResolver>) -> AppResult<Self> {
        let first = resolver.resolve_page(1).await?;

        tracing::debug!(records = first.len(), "Catalog pager started");

        Ok(Self {
            resolver,
            records: RwLock::new(first),
            next_page: AtomicU32::new(2),
            loading: AtomicBool::new(false),
        })
    }

    /// Appends the next page.
    ///
    /// Returns `Ok(false)` without fetching when a load is already in flight. A failed
    /// fetch leaves the list and the cursor where they were.
    pub async fn load_next(&self) -> AppResult<bool> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Catalog load already in flight");
            return Ok(false);
        }
        let _guard = LoadingGuard(&self.loading);

        let page = self.next_page.load(Ordering::Acquire);
        let fetched = self.resolver.resolve_page(page).await?;
        let count = fetched.len();

        self.records.write().await.extend(fetched);
        self.next_page.store(page + 1, Ordering::Release);

        tracing::info!(page, records = count, "Catalog page appended");

        Ok(true)
    }

    pub async fn records(&self) -> Vec<CatalogRecord> {
        self.records.read().await.clone()
    }

    pub fn next_page(&self) -> u32 {
        self.next_page.load(Ordering::Acquire)
    }

    pub fn status(&self) -> PagerStatus {
        if self.loading.load(Ordering::Acquire) {
            PagerStatus::InFlight
        } else {
            PagerStatus::Idle
        }
    }
}
