use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::{
    db::{CatalogQuery, CatalogStore},
    error::{AppError, AppResult},
    models::CatalogRecord,
};

/// A digit followed by `m` marks the medium-size cover; `l` is the large one.
const IMAGE_SIZE_PATTERN: &str = r"(\d)m";
const LARGE_IMAGE_REPLACEMENT: &str = "${1}l";

/// Turns catalog queries into display-ready records
///
/// Every record leaving the resolver has its cover URL upscaled, whichever way it
/// was fetched.
pub struct RecordResolver {
    store: Arc<dyn CatalogStore>,
    image_size: Regex,
}

impl RecordResolver {
    pub fn new(store: Arc<dyn CatalogStore>) -> AppResult<Self> {
        let image_size = Regex::new(IMAGE_SIZE_PATTERN)
            .map_err(|e| AppError::Internal(format!("Invalid image pattern: {}", e)))?;
        Ok(Self { store, image_size })
    }

    /// Resolves a raw query, normalizing each record
    pub async fn resolve(&self, query: CatalogQuery) -> AppResult<Vec<CatalogRecord>> {
        let records = self.store.fetch(query).await?;
        Ok(records.into_iter().map(|r| self.normalize(r)).collect())
    }

    pub async fn resolve_page(&self, page: u32) -> AppResult<Vec<CatalogRecord>> {
        self.resolve(CatalogQuery::Page(page)).await
    }

    /// Resolves ids in the order given, skipping ids the catalog lacks
    pub async fn resolve_ids(&self, ids: &[i64]) -> AppResult<Vec<CatalogRecord>> {
        let mut by_id: HashMap<i64, CatalogRecord> = self
            .resolve(CatalogQuery::Ids(ids.to_vec()))
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let resolved: Vec<CatalogRecord> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        if resolved.len() < ids.len() {
            tracing::warn!(
                requested = ids.len(),
                resolved = resolved.len(),
                "Some ids were not found in the catalog"
            );
        }

        Ok(resolved)
    }

    fn normalize(&self, mut record: CatalogRecord) -> CatalogRecord {
        record.image_url = self.upscale_image_url(&record.image_url);
        record
    }

    /// Rewrites the first size token only; URLs without one pass through
    pub fn upscale_image_url(&self, url: &str) -> String {
        self.image_size
            .replace(url, LARGE_IMAGE_REPLACEMENT)
            .into_owned()
    }
}
