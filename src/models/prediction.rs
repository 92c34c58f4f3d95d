use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::RatingEntry;

/// Width of the recommender's context window
pub const CONTEXT_WIDTH: usize = 10;

/// Body of `POST /api/predict`: parallel arrays, oldest rating first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub book_ids: Vec<i64>,
    pub book_ratings: Vec<i64>,
}

impl PredictRequest {
    /// Zips the parallel arrays into a validated rating history
    pub fn into_history(self) -> AppResult<Vec<RatingEntry>> {
        if self.book_ids.len() != self.book_ratings.len() {
            return Err(AppError::InvalidArgument(format!(
                "book_ids and book_ratings differ in length ({} vs {})",
                self.book_ids.len(),
                self.book_ratings.len()
            )));
        }

        self.book_ids
            .into_iter()
            .zip(self.book_ratings)
            .map(|(id, rating)| RatingEntry::new(id, rating))
            .collect()
    }
}

/// Fixed-width model input built from a rating history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelContext {
    pub context_ids: [i64; CONTEXT_WIDTH],
    pub context_ratings: [i64; CONTEXT_WIDTH],
    /// Every rated id, untruncated, for candidate exclusion
    pub history_ids: Vec<i64>,
}

// ============================================================================
// Model Serving API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServingInputs {
    pub context_id: [i64; CONTEXT_WIDTH],
    pub context_rating: [i64; CONTEXT_WIDTH],
}

/// Request body sent to the model-serving endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServingRequest {
    pub inputs: ServingInputs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServingOutputs {
    pub recommendation_ids: Vec<i64>,
}

/// Response body returned by the model-serving endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub outputs: ServingOutputs,
}
