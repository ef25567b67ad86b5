pub mod config;
pub mod errors;
pub mod recommend;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use errors::{ApplicationError, DomainError};
pub use recommend::{
    compute_recommendations, select_top_performer, RecommendationEngine, RecommendationInput,
    RecommendationResult, RecommendationWeights, ScoredStrategy, SecondaryProcessorWeights,
    TopPerformer,
};
