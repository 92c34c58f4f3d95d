use std::sync::Arc;

use crate::{
    db::CatalogStore,
    error::AppResult,
    services::{RecommendationService, RecordResolver, Recommender},
    session::SessionRegistry,
    storage::DurableStorage,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RecordResolver>,
    pub recommendations: Arc<RecommendationService>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Wires the pipeline from its three external collaborators
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        recommender: Arc<dyn Recommender>,
        storage: Arc<dyn DurableStorage>,
        max_sessions: usize,
    ) -> AppResult<Self> {
        let resolver = Arc::new(RecordResolver::new(catalog)?);
        let recommendations = Arc::new(RecommendationService::new(resolver.clone(), recommender));
        let sessions = Arc::new(SessionRegistry::new(storage, resolver.clone(), max_sessions));

        Ok(Self {
            resolver,
            recommendations,
            sessions,
        })
    }
}
