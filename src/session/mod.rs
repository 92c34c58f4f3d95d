//! Per-visitor state: rating history, last recommendations and catalog browsing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogRecord, RatingEntry},
    services::{RecommendationService, RecordResolver},
    storage::{DurableStorage, StorageKey},
};

pub mod pager;
pub mod ratings;
pub mod recommendations;

pub use pager::{CatalogPager, PagerStatus};
pub use ratings::RatingStore;
pub use recommendations::RecommendationStore;

const MAX_SESSION_ID_LEN: usize = 64;

/// Live sessions kept in memory when no bound is configured
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Durable part of a session as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub ratings: Vec<RatingEntry>,
    pub recommendations: Vec<CatalogRecord>,
}

pub struct Session {
    id: String,
    /// Bumped by every reset; held while a recommendation result is stored
    generation: Mutex<u64>,
    ratings: RatingStore,
    recommendations: RecommendationStore,
    pager: CatalogPager,
}

impl Session {
    /// Restores durable state and loads the first catalog page
    pub async fn open(
        id: &str,
        storage: Arc<dyn DurableStorage>,
        resolver: Arc<RecordResolver>,
    ) -> AppResult<Self> {
        let pager = CatalogPager::start(resolver).await?;
        let ratings = RatingStore::restore(storage.clone(), id).await;
        let recommendations = RecommendationStore::restore(storage, id).await;

        Ok(Self {
            id: id.to_string(),
            generation: Mutex::new(0),
            ratings,
            recommendations,
            pager,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ratings(&self) -> &RatingStore {
        &self.ratings
    }

    pub fn recommendations(&self) -> &RecommendationStore {
        &self.recommendations
    }

    pub fn pager(&self) -> &CatalogPager {
        &self.pager
    }

    /// Replaces the stored recommendations with a fresh prediction.
    ///
    /// On failure the previous list is left as it was. A result computed from a history
    /// that was reset while the prediction ran is returned but not stored.
    pub async fn recommend(
        &self,
        service: &RecommendationService,
    ) -> AppResult<Vec<CatalogRecord>> {
        let started_at = *self.generation.lock().await;
        let history = self.ratings.history().await;
        let records = service.recommend(&history).await?;

        let generation = self.generation.lock().await;
        if *generation != started_at {
            tracing::info!(
                session = %self.id,
                "Session reset during prediction; recommendations not stored"
            );
            return Ok(records);
        }
        self.recommendations
            .set_recommendations(records.clone())
            .await;
        drop(generation);

        tracing::info!(
            session = %self.id,
            recommendations = records.len(),
            "Recommendations stored"
        );

        Ok(records)
    }

    /// Clears ratings and recommendations together
    pub async fn reset(&self) {
        let mut generation = self.generation.lock().await;
        *generation += 1;
        self.ratings.reset().await;
        self.recommendations.reset().await;
        tracing::info!(session = %self.id, "Session reset");
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            ratings: self.ratings.history().await,
            recommendations: self.recommendations.recommendations().await,
        }
    }
}

struct LiveSession {
    session: Arc<Session>,
    last_used: AtomicU64,
}

/// Open sessions keyed by client-chosen id
///
/// Holds at most `capacity` sessions. Opening one more evicts the least recently used;
/// its durable state is restored the next time the id is seen.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, LiveSession>>,
    clock: AtomicU64,
    capacity: usize,
    storage: Arc<dyn DurableStorage>,
    resolver: Arc<RecordResolver>,
}

impl SessionRegistry {
    pub fn new(
        storage: Arc<dyn DurableStorage>,
        resolver: Arc<RecordResolver>,
        capacity: usize,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            capacity: capacity.max(1),
            storage,
            resolver,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    async fn live(&self, id: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().await;
        let live = sessions.get(id)?;
        live.last_used.store(self.tick(), Ordering::Relaxed);
        Some(live.session.clone())
    }

    /// Returns the live session, opening (and restoring) it on first use
    pub async fn get_or_open(&self, id: &str) -> AppResult<Arc<Session>> {
        validate_session_id(id)?;

        if let Some(session) = self.live(id).await {
            return Ok(session);
        }

        let opened = Session::open(id, self.storage.clone(), self.resolver.clone()).await?;

        let mut sessions = self.sessions.write().await;
        if let Some(live) = sessions.get(id) {
            live.last_used.store(self.tick(), Ordering::Relaxed);
            return Ok(live.session.clone());
        }

        if sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, live)| live.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                tracing::debug!(session = %oldest, "Idle session evicted");
            }
        }

        let session = Arc::new(opened);
        sessions.insert(
            id.to_string(),
            LiveSession {
                session: session.clone(),
                last_used: AtomicU64::new(self.tick()),
            },
        );
        tracing::info!(session = %id, live = sessions.len(), "Session opened");

        Ok(session)
    }

    /// Clears a session's ratings and recommendations.
    ///
    /// A session that is not live is cleared in durable storage without being opened.
    pub async fn reset(&self, id: &str) -> AppResult<()> {
        validate_session_id(id)?;

        match self.live(id).await {
            Some(session) => session.reset().await,
            None => {
                self.storage.remove(&StorageKey::Ratings(id.to_string()));
                self.storage
                    .remove(&StorageKey::Recommendations(id.to_string()));
                tracing::info!(session = %id, "Stored session state cleared");
            }
        }

        Ok(())
    }

    /// Number of sessions currently held in memory
    pub async fn live_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn storage(&self) -> &dyn DurableStorage {
        self.storage.as_ref()
    }
}

fn validate_session_id(id: &str) -> AppResult<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidArgument(format!(
            "session id must be 1-{} characters of [A-Za-z0-9_-]",
            MAX_SESSION_ID_LEN
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::catalog::MockCatalogStore;
    use crate::db::CatalogQuery;
    use crate::models::CONTEXT_WIDTH;
    use crate::services::recommender::MockRecommender;
    use crate::services::Recommender;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn record(id: i64) -> CatalogRecord {
        CatalogRecord {
            id,
            external_id: id,
            title: format!("Book {}", id),
            author_name: "Someone".to_string(),
            link: "https://www.goodreads.com".to_string(),
            image_url: "https://images.gr-assets.com/books/1m/x.jpg".to_string(),
        }
    }

    fn catalog() -> Arc<RecordResolver> {
        let mut store = MockCatalogStore::new();
        store.expect_fetch().returning(|query| match query {
            CatalogQuery::Page(page) => {
                let first = (page as i64 - 1) * 10 + 1;
                Ok((first..first + 10).map(record).collect())
            }
            CatalogQuery::Ids(ids) => Ok(ids.into_iter().map(record).collect()),
        });
        Arc::new(RecordResolver::new(Arc::new(store)).unwrap())
    }

    fn service(resolver: Arc<RecordResolver>, candidates: Result<Vec<i64>, String>) -> RecommendationService {
        let mut recommender = MockRecommender::new();
        recommender.expect_predict().returning(move |_, _| {
            candidates
                .clone()
                .map_err(AppError::PredictionFailed)
        });
        recommender.expect_name().return_const("mock");
        RecommendationService::new(resolver, Arc::new(recommender))
    }

    /// Holds every prediction until `release` is notified
    #[derive(Default)]
    struct GatedRecommender {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl Recommender for GatedRecommender {
        async fn predict(
            &self,
            _context_ids: [i64; CONTEXT_WIDTH],
            _context_ratings: [i64; CONTEXT_WIDTH],
        ) -> AppResult<Vec<i64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(vec![3, 9, 12])
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    fn ids(records: &[CatalogRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_session_id_validation() {
        assert!(validate_session_id("visitor-42_a").is_ok());
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("has space").is_err());
        assert!(validate_session_id(&"x".repeat(65)).is_err());
    }

    #[tokio::test]
    async fn test_registry_reuses_open_session() {
        let registry = SessionRegistry::new(Arc::new(MemoryStorage::new()), catalog(), 4);

        let a = registry.get_or_open("abc").await.unwrap();
        let b = registry.get_or_open("abc").await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id(), "abc");
        assert_eq!(a.pager().records().await.len(), 10);
    }

    #[tokio::test]
    async fn test_recommend_stores_result_and_reset_clears_both() {
        let resolver = catalog();
        let session = Session::open("s", Arc::new(MemoryStorage::new()), resolver.clone())
            .await
            .unwrap();
        session.ratings().set_rating(3, 5).await.unwrap();
        session.ratings().set_rating(7, 2).await.unwrap();

        let records = session
            .recommend(&service(resolver, Ok(vec![3, 9, 7, 12, 15])))
            .await
            .unwrap();

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 12, 15]);
        assert_eq!(session.recommendations().recommendations().await, records);

        session.reset().await;
        let snapshot = session.snapshot().await;
        assert!(snapshot.ratings.is_empty());
        assert!(snapshot.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_failed_recommendation_keeps_previous_list() {
        let resolver = catalog();
        let session = Session::open("s", Arc::new(MemoryStorage::new()), resolver.clone())
            .await
            .unwrap();
        session.ratings().set_rating(1, 4).await.unwrap();
        session
            .recommend(&service(resolver.clone(), Ok(vec![2, 3])))
            .await
            .unwrap();

        let result = session
            .recommend(&service(resolver, Err("timeout".to_string())))
            .await;

        assert!(matches!(result, Err(AppError::PredictionFailed(_))));
        let kept: Vec<i64> = session
            .recommendations()
            .recommendations()
            .await
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_reopened_session_restores_state() {
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
        let resolver = catalog();

        let first = SessionRegistry::new(storage.clone(), resolver.clone(), 4);
        let session = first.get_or_open("v1").await.unwrap();
        session.ratings().set_rating(5, 3).await.unwrap();
        session
            .recommend(&service(resolver.clone(), Ok(vec![6])))
            .await
            .unwrap();

        let second = SessionRegistry::new(storage, resolver, 4);
        let restored = second.get_or_open("v1").await.unwrap().snapshot().await;

        assert_eq!(restored.ratings, vec![RatingEntry::new(5, 3).unwrap()]);
        assert_eq!(restored.recommendations.len(), 1);
        assert_eq!(restored.recommendations[0].id, 6);
    }

    #[tokio::test]
    async fn test_reset_during_prediction_is_not_undone() {
        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
        let resolver = catalog();
        let session = Arc::new(
            Session::open("s", storage.clone(), resolver.clone())
                .await
                .unwrap(),
        );
        session.ratings().set_rating(3, 5).await.unwrap();

        let recommender = Arc::new(GatedRecommender::default());
        let service = Arc::new(RecommendationService::new(resolver, recommender.clone()));
        let pending = tokio::spawn({
            let session = session.clone();
            let service = service.clone();
            async move { session.recommend(&service).await }
        });
        while recommender.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        session.reset().await;
        recommender.release.notify_one();
        let returned = pending.await.unwrap().unwrap();

        assert_eq!(ids(&returned), vec![9, 12]);
        let snapshot = session.snapshot().await;
        assert!(snapshot.ratings.is_empty());
        assert!(snapshot.recommendations.is_empty());
        assert_eq!(
            storage
                .get(&StorageKey::Recommendations("s".to_string()))
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_registry_evicts_least_recently_used() {
        let registry = SessionRegistry::new(Arc::new(MemoryStorage::new()), catalog(), 2);

        let a = registry.get_or_open("a").await.unwrap();
        let b = registry.get_or_open("b").await.unwrap();
        b.ratings().set_rating(7, 4).await.unwrap();
        registry.get_or_open("a").await.unwrap();
        registry.get_or_open("c").await.unwrap();

        assert_eq!(registry.live_count().await, 2);
        assert!(Arc::ptr_eq(&a, &registry.get_or_open("a").await.unwrap()));

        let b_again = registry.get_or_open("b").await.unwrap();
        assert!(!Arc::ptr_eq(&b, &b_again));
        assert_eq!(b_again.ratings().history().await, vec![RatingEntry::new(7, 4).unwrap()]);
        assert_eq!(registry.live_count().await, 2);
    }

    #[tokio::test]
    async fn test_registry_stays_bounded_under_many_ids() {
        let registry = SessionRegistry::new(Arc::new(MemoryStorage::new()), catalog(), 8);

        for n in 0..200 {
            registry.get_or_open(&format!("visitor-{}", n)).await.unwrap();
        }

        assert_eq!(registry.live_count().await, 8);
    }

    #[tokio::test]
    async fn test_reset_of_unopened_session_skips_catalog() {
        let mut store = MockCatalogStore::new();
        store.expect_fetch().never();
        let resolver = Arc::new(RecordResolver::new(Arc::new(store)).unwrap());

        let storage: Arc<dyn DurableStorage> = Arc::new(MemoryStorage::new());
        let ratings_key = StorageKey::Ratings("ghost".to_string());
        let wrecks_key = StorageKey::Recommendations("ghost".to_string());
        storage.set(&ratings_key, "[[1,5]]".to_string());
        storage.set(&wrecks_key, "[]".to_string());

        let registry = SessionRegistry::new(storage.clone(), resolver, 4);
        registry.reset("ghost").await.unwrap();

        assert_eq!(storage.get(&ratings_key).await, None);
        assert_eq!(storage.get(&wrecks_key).await, None);
        assert_eq!(registry.live_count().await, 0);
        assert!(registry.reset("not valid").await.is_err());
    }
}
