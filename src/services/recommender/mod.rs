//! External recommender abstraction
//!
//! The model is opaque: it takes a fixed-width context of recent ratings and answers
//! with candidate ids, best first. Implementations report every failure as
//! `AppError::PredictionFailed` and never retry.

use crate::{error::AppResult, models::CONTEXT_WIDTH};

pub mod model_serving;

pub use model_serving::ModelServingClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Recommender: Send + Sync {
    /// Returns ranked candidate ids for the given context
    async fn predict(
        &self,
        context_ids: [i64; CONTEXT_WIDTH],
        context_ratings: [i64; CONTEXT_WIDTH],
    ) -> AppResult<Vec<i64>>;

    /// Recommender name for logging
    fn name(&self) -> &'static str;
}
