use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    db::CatalogQuery,
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{CatalogRecord, PredictRequest, RatingEntry},
    session::{PagerStatus, Session},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct BooksQuery {
    pub page: Option<i64>,
    /// Comma-separated catalog ids
    pub ids: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRatingRequest {
    pub rating: i64,
}

#[derive(Debug, Serialize)]
pub struct PagerResponse {
    pub records: Vec<CatalogRecord>,
    pub next_page: u32,
    pub status: PagerStatus,
}

#[derive(Debug, Serialize)]
pub struct LoadNextResponse {
    /// False when another load was already in flight
    pub fetched: bool,
    #[serde(flatten)]
    pub pager: PagerResponse,
}

fn parse_ids(raw: &str) -> AppResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::InvalidArgument(format!("invalid catalog id: {}", s)))
        })
        .collect()
}

async fn pager_view(session: &Session) -> PagerResponse {
    let pager = session.pager();
    PagerResponse {
        records: pager.records().await,
        next_page: pager.next_page(),
        status: pager.status(),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "storage": state.sessions.storage().kind().as_str(),
        })),
    )
}

/// One page of the catalog, or an explicit id set
pub async fn get_books(
    State(state): State<AppState>,
    Query(params): Query<BooksQuery>,
) -> AppResult<Json<Vec<CatalogRecord>>> {
    let ids = params.ids.as_deref().map(parse_ids).transpose()?;
    let page = match (&ids, params.page) {
        (None, None) => Some(1),
        (_, page) => page,
    };

    let query = CatalogQuery::from_parts(page, ids)?;
    let records = state.resolver.resolve(query).await?;

    Ok(Json(records))
}

/// Stateless recommendation from a client-held rating history
pub async fn predict(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PredictRequest>,
) -> AppResult<Json<Vec<CatalogRecord>>> {
    let history = request.into_history()?;

    tracing::info!(
        request_id = %request_id,
        history = history.len(),
        "Processing prediction request"
    );

    let records = state.recommendations.recommend(&history).await?;

    tracing::info!(
        request_id = %request_id,
        recommendations = records.len(),
        "Prediction completed"
    );

    Ok(Json(records))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<crate::session::SessionSnapshot>> {
    let session = state.sessions.get_or_open(&session_id).await?;
    Ok(Json(session.snapshot().await))
}

/// Clears ratings and recommendations together
pub async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    state.sessions.reset(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_rating(
    State(state): State<AppState>,
    Path((session_id, book_id)): Path<(String, i64)>,
    Json(request): Json<SetRatingRequest>,
) -> AppResult<Json<Vec<RatingEntry>>> {
    let session = state.sessions.get_or_open(&session_id).await?;
    session.ratings().set_rating(book_id, request.rating).await?;

    tracing::debug!(session = %session_id, book_id, rating = request.rating, "Rating set");

    Ok(Json(session.ratings().history().await))
}

pub async fn clear_rating(
    State(state): State<AppState>,
    Path((session_id, book_id)): Path<(String, i64)>,
) -> AppResult<Json<Vec<RatingEntry>>> {
    let session = state.sessions.get_or_open(&session_id).await?;
    session.ratings().clear_rating(book_id).await;
    Ok(Json(session.ratings().history().await))
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Vec<CatalogRecord>>> {
    let session = state.sessions.get_or_open(&session_id).await?;
    Ok(Json(session.recommendations().recommendations().await))
}

/// Runs the recommender over the session's rating history
pub async fn create_recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Vec<CatalogRecord>>> {
    let session = state.sessions.get_or_open(&session_id).await?;

    tracing::info!(
        request_id = %request_id,
        session = %session_id,
        "Processing session recommendation request"
    );

    let records = session.recommend(&state.recommendations).await?;
    Ok(Json(records))
}

pub async fn get_session_books(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<PagerResponse>> {
    let session = state.sessions.get_or_open(&session_id).await?;
    Ok(Json(pager_view(&session).await))
}

/// Appends the next catalog page to the session's list
pub async fn load_next_books(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<LoadNextResponse>> {
    let session = state.sessions.get_or_open(&session_id).await?;
    let fetched = session.pager().load_next().await?;

    Ok(Json(LoadNextResponse {
        fetched,
        pager: pager_view(&session).await,
    }))
}
