use serde::{Deserialize, Serialize};

/// A book as stored in the catalog and served to clients.
///
/// Field names on the wire match the `books` table columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct CatalogRecord {
    /// Primary key; defines page ordering
    #[serde(rename = "work_index")]
    #[sqlx(rename = "work_index")]
    pub id: i64,
    /// Upstream catalog identifier
    #[serde(rename = "book_id")]
    #[sqlx(rename = "book_id")]
    pub external_id: i64,
    pub title: String,
    pub author_name: String,
    pub link: String,
    pub image_url: String,
}
