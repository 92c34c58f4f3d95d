pub mod catalog;
pub mod prediction;
pub mod rating;

pub use catalog::CatalogRecord;
pub use prediction::{
    ModelContext, PredictRequest, PredictResponse, ServingInputs, ServingRequest, CONTEXT_WIDTH,
};
pub use rating::{validate_catalog_id, Rating, RatingEntry};
