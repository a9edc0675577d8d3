pub mod catalog;
pub mod error;
pub mod literal;
pub mod profile;
pub mod prompt;
pub mod similarity;

// Re-export commonly used types
pub use catalog::{normalize_title, CatalogStore, MovieRecord};
pub use error::{DataError, Result};
pub use profile::{PreferenceProfile, ProfileField};
pub use prompt::{compose, Language, PromptRequest};
pub use similarity::{RecommendationResult, SimilarityEntry, SimilarityIndex, UNKNOWN_GENRE};
