pub mod catalog;
pub mod sqlite;

pub use catalog::{CatalogQuery, CatalogStore, SqliteCatalogStore, MAX_ID_SET, PAGE_SIZE};
pub use sqlite::{create_pool, run_migrations};
