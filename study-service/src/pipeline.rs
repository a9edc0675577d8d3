use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use synopsis_core::{
    compose, CatalogStore, Language, PreferenceProfile, ProfileField, PromptRequest,
    RecommendationResult, SimilarityIndex,
};

use crate::generator::SynopsisGenerator;

/// How many similar titles a run asks the index for.
pub const TOP_N: usize = 5;

/// Shown in place of a synopsis when the generation call fails. Generation
/// failures never fail the run; the participant may simply retry.
pub const GENERATION_FAILURE_SENTINEL: &str = "[Error generating synopsis]";

/// Everything produced by one run of the flow, kept on the session until the
/// participant's feedback is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub watched_title: String,
    pub watched_synopsis: String,
    pub profile: PreferenceProfile,
    pub skipped_fields: Vec<ProfileField>,
    pub recommended_title: String,
    pub recommended_synopsis: String,
    pub recommended_genre: String,
    pub personalized_synopsis: String,
    /// Full ranked result list; the first element is the primary
    /// recommendation shown above, the rest are alternatives.
    pub recommendations: Vec<RecommendationResult>,
}

/// One synchronous pass: similarity lookup, catalog resolution, prompt
/// composition, generation call. Stores are injected and read-only.
pub struct RecommendationPipeline {
    catalog: Arc<CatalogStore>,
    similarity: Arc<SimilarityIndex>,
    generator: Arc<dyn SynopsisGenerator>,
}

impl RecommendationPipeline {
    pub fn new(
        catalog: Arc<CatalogStore>,
        similarity: Arc<SimilarityIndex>,
        generator: Arc<dyn SynopsisGenerator>,
    ) -> Self {
        Self {
            catalog,
            similarity,
            generator,
        }
    }

    /// Run the flow for one watched title. Returns `None` when the
    /// similarity index has nothing for the title, which the caller reports
    /// as "no recommendation available".
    pub async fn run(
        &self,
        watched_title: &str,
        profile: PreferenceProfile,
        language: Language,
    ) -> Option<RunOutcome> {
        let recommendations = self.similarity.top_similar(watched_title, TOP_N, &self.catalog);
        let top = recommendations.first()?.clone();

        info!(
            watched = %watched_title,
            recommended = %top.title,
            candidates = recommendations.len(),
            "similarity lookup complete"
        );

        let watched = self.catalog.lookup(watched_title);
        let watched_display = watched
            .map(|record| record.title.clone())
            .unwrap_or_else(|| watched_title.trim().to_string());
        let watched_synopsis = watched
            .map(|record| record.synopsis.clone())
            .unwrap_or_default();

        // The recommended title may be absent from the catalog; its genre
        // already carries the "Unknown" fallback from the index.
        let recommended = self.catalog.lookup(&top.title);
        let recommended_title = recommended
            .map(|record| record.title.clone())
            .unwrap_or_else(|| top.title.clone());
        let recommended_synopsis = recommended
            .map(|record| record.synopsis.clone())
            .unwrap_or_default();
        let recommended_reviews = recommended
            .map(|record| record.review_text.clone())
            .unwrap_or_default();

        let prompt = compose(&PromptRequest {
            watched_title: &watched_display,
            watched_synopsis: &watched_synopsis,
            rec_title: &recommended_title,
            rec_synopsis: &recommended_synopsis,
            rec_genre: &top.genre,
            rec_reviews: &recommended_reviews,
            profile: &profile,
            language,
        });

        let personalized_synopsis = match self.generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!("generation call failed: {e}");
                GENERATION_FAILURE_SENTINEL.to_string()
            }
        };

        Some(RunOutcome {
            watched_title: watched_display,
            watched_synopsis,
            skipped_fields: profile.skipped_fields(),
            profile,
            recommended_title,
            recommended_synopsis,
            recommended_genre: top.genre.clone(),
            personalized_synopsis,
            recommendations,
        })
    }
}
