use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use synopsis_core::{Language, PreferenceProfile, ProfileField, RecommendationResult};

/// One appended line per completed run, mirroring the study's feedback form.
#[derive(Debug, Serialize)]
pub struct RunRecord<'a> {
    pub timestamp: String,
    pub session_id: &'a str,
    pub language: Language,
    pub movie_watched: &'a str,
    pub user_profile: &'a PreferenceProfile,
    pub skipped_fields: &'a [ProfileField],
    pub watched_synopsis: &'a str,
    pub recommended_movie: &'a str,
    pub recommended_synopsis: &'a str,
    pub personalized_synopsis: &'a str,
    pub top_n_recommendations: &'a [RecommendationResult],
    pub rating_match: u8,
    pub rating_engagement: u8,
    pub would_watch: bool,
    pub user_feedback_text: &'a str,
    pub run_number: u32,
}

/// Closing free-text feedback once the study completed.
#[derive(Debug, Serialize)]
pub struct FinalRecord<'a> {
    pub timestamp: String,
    pub session_id: &'a str,
    pub final_feedback: &'a str,
}

/// RFC 3339 timestamp for log records.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Append-only JSONL sink for study analytics.
///
/// Write failures are logged and swallowed: losing a log line must never
/// abort or corrupt the pipeline run it belongs to.
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append<T: Serialize>(&self, record: &T) {
        if let Err(e) = self.try_append(record) {
            error!(path = %self.path.display(), "failed to append interaction record: {e}");
        }
    }

    fn try_append<T: Serialize>(&self, record: &T) -> anyhow::Result<()> {
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
