use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{AppError, AppResult},
    models::CatalogRecord,
};

/// Rows per catalog page
pub const PAGE_SIZE: i64 = 10;

/// Largest id set accepted in one query; stays under SQLite's bound-parameter limit
pub const MAX_ID_SET: usize = 500;

const COLUMNS: &str = "work_index, book_id, title, author_name, link, image_url";

/// A single read against the catalog: either one page or an explicit id set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogQuery {
    /// 1-based page number
    Page(u32),
    Ids(Vec<i64>),
}

impl CatalogQuery {
    pub fn page(page: i64) -> AppResult<Self> {
        u32::try_from(page)
            .ok()
            .filter(|p| *p >= 1)
            .map(CatalogQuery::Page)
            .ok_or_else(|| AppError::InvalidArgument(format!("page must be >= 1, got {}", page)))
    }

    /// Builds a query from optional request parameters; exactly one must be present.
    pub fn from_parts(page: Option<i64>, ids: Option<Vec<i64>>) -> AppResult<Self> {
        match (page, ids) {
            (Some(_), Some(_)) => Err(AppError::InvalidArgument(
                "supply either a page or an id set, not both".to_string(),
            )),
            (None, None) => Err(AppError::InvalidArgument(
                "a page or an id set is required".to_string(),
            )),
            (Some(page), None) => Self::page(page),
            (None, Some(ids)) if ids.len() > MAX_ID_SET => Err(AppError::InvalidArgument(
                format!("at most {} ids per request, got {}", MAX_ID_SET, ids.len()),
            )),
            (None, Some(ids)) => Ok(CatalogQuery::Ids(ids)),
        }
    }
}

/// Read access to the catalog rows
///
/// Page results are ordered by primary key. Id-set results come back in
/// whatever order the store produces them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn fetch(&self, query: CatalogQuery) -> AppResult<Vec<CatalogRecord>>;
}

/// SQLite-backed catalog
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_page(&self, page: u32) -> AppResult<Vec<CatalogRecord>> {
        if page == 0 {
            return Err(AppError::InvalidArgument("page must be >= 1".to_string()));
        }
        let first_index = 1 + (page as i64 - 1) * PAGE_SIZE;

        let rows = sqlx::query_as::<_, CatalogRecord>(&format!(
            "SELECT {COLUMNS} FROM books WHERE work_index >= ? ORDER BY work_index LIMIT ?"
        ))
        .bind(first_index)
        .bind(PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(page, rows = rows.len(), "Catalog page fetched");

        Ok(rows)
    }

    async fn fetch_ids(&self, ids: &[i64]) -> AppResult<Vec<CatalogRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM books WHERE work_index IN ("));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<CatalogRecord>()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(requested = ids.len(), rows = rows.len(), "Catalog ids fetched");

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn fetch(&self, query: CatalogQuery) -> AppResult<Vec<CatalogRecord>> {
        match query {
            CatalogQuery::Page(page) => self.fetch_page(page).await,
            CatalogQuery::Ids(ids) => self.fetch_ids(&ids).await,
        }
    }
}
