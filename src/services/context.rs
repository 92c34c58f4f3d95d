use crate::models::{ModelContext, RatingEntry, CONTEXT_WIDTH};

/// Id and rating used to fill unused context slots
pub const PADDING: i64 = 0;

/// Builds the recommender input from a rating history (oldest first).
///
/// The newest `CONTEXT_WIDTH` entries keep their order and any remaining slots are
/// padded at the end. The full history id list rides along for candidate exclusion.
pub fn build_context(history: &[RatingEntry]) -> ModelContext {
    let recent = &history[history.len().saturating_sub(CONTEXT_WIDTH)..];

    let mut context_ids = [PADDING; CONTEXT_WIDTH];
    let mut context_ratings = [PADDING; CONTEXT_WIDTH];
    for (slot, entry) in recent.iter().enumerate() {
        context_ids[slot] = entry.catalog_id;
        context_ratings[slot] = entry.rating.value();
    }

    ModelContext {
        context_ids,
        context_ratings,
        history_ids: history.iter().map(|e| e.catalog_id).collect(),
    }
}
