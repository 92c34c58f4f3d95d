use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogRecord, RatingEntry},
    services::{
        candidates::{filter_candidates, TOP_N},
        context::build_context,
        recommender::Recommender,
        resolver::RecordResolver,
    },
};

/// Runs a rating history through the recommender and back into catalog records
pub struct RecommendationService {
    resolver: Arc<RecordResolver>,
    recommender: Arc<dyn Recommender>,
    top_n: usize,
}

impl RecommendationService {
    pub fn new(resolver: Arc<RecordResolver>, recommender: Arc<dyn Recommender>) -> Self {
        Self {
            resolver,
            recommender,
            top_n: TOP_N,
        }
    }

    /// Produces up to `TOP_N` unrated books for the given history, best first.
    ///
    /// An empty history is rejected before the recommender is contacted.
    pub async fn recommend(&self, history: &[RatingEntry]) -> AppResult<Vec<CatalogRecord>> {
        if history.is_empty() {
            return Err(AppError::InvalidArgument(
                "rate at least one book before requesting recommendations".to_string(),
            ));
        }

        let context = build_context(history);

        let candidates = self
            .recommender
            .predict(context.context_ids, context.context_ratings)
            .await?;
        let candidate_count = candidates.len();

        let selected = filter_candidates(&context.history_ids, candidates, self.top_n);

        tracing::info!(
            history = history.len(),
            candidates = candidate_count,
            selected = selected.len(),
            recommender = self.recommender.name(),
            "Candidates filtered"
        );

        self.resolver.resolve_ids(&selected).await
    }
}
