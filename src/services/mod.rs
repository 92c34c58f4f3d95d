pub mod candidates;
pub mod context;
pub mod recommendations;
pub mod recommender;
pub mod resolver;

pub use recommendations::RecommendationService;
pub use recommender::{ModelServingClient, Recommender};
pub use resolver::RecordResolver;
