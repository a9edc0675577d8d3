use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The five profile fields, in the order they appear in prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Tone,
    Style,
    GenrePreferences,
    Likes,
    Avoid,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::Tone,
        ProfileField::Style,
        ProfileField::GenrePreferences,
        ProfileField::Likes,
        ProfileField::Avoid,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProfileField::Tone => "tone",
            ProfileField::Style => "style",
            ProfileField::GenrePreferences => "genre_preferences",
            ProfileField::Likes => "likes",
            ProfileField::Avoid => "avoid",
        }
    }
}

/// User-stated taste signals used to personalize the generated synopsis.
///
/// Every field may be empty; emptiness means "no preference" and is valid.
/// A pure value with accessors, nothing else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub tone: String,
    pub style: String,
    pub genre_preferences: BTreeSet<String>,
    pub likes: String,
    pub avoid: String,
}

impl PreferenceProfile {
    /// Build a profile from raw user input: string fields are trimmed,
    /// genre tags are trimmed and collected into an ordered set. No other
    /// validation is applied.
    pub fn new<I, S>(tone: &str, style: &str, genres: I, likes: &str, avoid: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tone: tone.trim().to_string(),
            style: style.trim().to_string(),
            genre_preferences: genres
                .into_iter()
                .map(|g| g.as_ref().trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            likes: likes.trim().to_string(),
            avoid: avoid.trim().to_string(),
        }
    }

    pub fn is_empty(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Tone => self.tone.is_empty(),
            ProfileField::Style => self.style.is_empty(),
            ProfileField::GenrePreferences => self.genre_preferences.is_empty(),
            ProfileField::Likes => self.likes.is_empty(),
            ProfileField::Avoid => self.avoid.is_empty(),
        }
    }

    /// True when at least one field is stated.
    pub fn has_any(&self) -> bool {
        ProfileField::ALL.iter().any(|field| !self.is_empty(*field))
    }

    /// Fields the user left empty, for downstream analytics.
    pub fn skipped_fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|field| self.is_empty(*field))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_fields_and_genre_tags() {
        let profile =
            PreferenceProfile::new("  uplifting ", "", [" Sci-Fi ", "", "Drama"], "twists", "  ");
        assert_eq!(profile.tone, "uplifting");
        assert_eq!(profile.style, "");
        assert_eq!(
            profile.genre_preferences,
            BTreeSet::from(["Drama".to_string(), "Sci-Fi".to_string()])
        );
        assert_eq!(profile.likes, "twists");
        assert_eq!(profile.avoid, "");
    }

    #[test]
    fn skipped_fields_tracks_each_field_independently() {
        let profile = PreferenceProfile::new("uplifting", "", ["Sci-Fi"], "", "");
        assert_eq!(
            profile.skipped_fields(),
            vec![ProfileField::Style, ProfileField::Likes, ProfileField::Avoid]
        );
        assert!(profile.is_empty(ProfileField::Style));
        assert!(!profile.is_empty(ProfileField::Tone));
        assert!(profile.has_any());
    }

    #[test]
    fn empty_profile_skips_everything() {
        let profile = PreferenceProfile::default();
        assert!(!profile.has_any());
        assert_eq!(profile.skipped_fields(), ProfileField::ALL.to_vec());
    }
}
