//! Deterministic prompt construction.
//!
//! `compose` turns the watched movie, the recommended movie's metadata and
//! the user's preference profile into a single natural-language instruction
//! for the text-generation collaborator. The segment order is fixed and the
//! output is byte-identical for identical inputs; the function performs no
//! I/O.

use serde::{Deserialize, Serialize};

use crate::profile::PreferenceProfile;

/// Output language for the generated synopsis. English is the default and
/// adds no directive to the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    German,
}

/// Fixed instruction block appended to every prompt.
const REWRITE_INSTRUCTIONS: &str = "\n\nRewrite the synopsis of the recommended movie in a way that highlights the aspects of it that may be interesting or emotionally resonant to the user, based on their past viewing and preferences. Do not make up facts. Maintain the core plot but emphasize connections.\n\nAlways prioritize the information explicitly given in the synopsis, genre, and reviews. Only use your own external knowledge about the recommended movie if the provided materials are insufficient to support a meaningful personalized rewrite.\nIf you must use external knowledge, apply the same principles: \n- Do not fabricate events, scenes, or character arcs.\n- Do not invent thematic depth that is not implied or supported.\n- Only highlight elements that genuinely align with the user's preferences.\n\nIf even external knowledge is not sufficient to personalize meaningfully, say so clearly instead of guessing or exaggerating.";

/// Final-language directive appended only for German output.
const GERMAN_DIRECTIVE: &str = "\n\nPlease write the final personalized synopsis in German.";

/// Everything a prompt is built from. A plain value; building the prompt
/// from it is pure.
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub watched_title: &'a str,
    pub watched_synopsis: &'a str,
    pub rec_title: &'a str,
    pub rec_synopsis: &'a str,
    pub rec_genre: &'a str,
    pub rec_reviews: &'a str,
    pub profile: &'a PreferenceProfile,
    pub language: Language,
}

/// Assemble the personalization prompt. Empty optional segments are omitted
/// entirely; present text segments are appended verbatim after trimming.
pub fn compose(request: &PromptRequest) -> String {
    let mut prompt = format!(
        "You are a movie recommendation assistant. A user has recently watched the film \"{}\".",
        request.watched_title
    );

    if !request.watched_synopsis.is_empty() {
        prompt.push_str(&format!(
            " Here is a short summary of that movie: {}",
            request.watched_synopsis.trim()
        ));
    }

    prompt.push_str(&format!(
        " Now you want to recommend the movie \"{}\".",
        request.rec_title
    ));

    if !request.rec_synopsis.is_empty() {
        prompt.push_str(&format!(
            " Here is its original synopsis: {}",
            request.rec_synopsis.trim()
        ));
    }

    if !request.rec_genre.is_empty() {
        prompt.push_str(&format!(
            " The genre(s) of this movie are: {}.",
            request.rec_genre
        ));
    }

    if !request.rec_reviews.is_empty() {
        prompt.push_str(&format!(
            " Here are some viewer opinions: {}",
            request.rec_reviews.trim()
        ));
    }

    let profile = request.profile;
    if profile.has_any() {
        prompt.push_str("\n\nThe user's preferences are as follows:");
        if !profile.tone.is_empty() {
            prompt.push_str(&format!("\n- Preferred tone: {}", profile.tone));
        }
        if !profile.style.is_empty() {
            prompt.push_str(&format!("\n- Preferred narrative style: {}", profile.style));
        }
        if !profile.genre_preferences.is_empty() {
            let genres: Vec<&str> = profile.genre_preferences.iter().map(String::as_str).collect();
            prompt.push_str(&format!("\n- Enjoyed genres: {}", genres.join(", ")));
        }
        if !profile.likes.is_empty() {
            prompt.push_str(&format!("\n- Enjoyed themes or elements: {}", profile.likes));
        }
        if !profile.avoid.is_empty() {
            prompt.push_str(&format!(
                "\n- Disliked themes or things to avoid: {}",
                profile.avoid
            ));
        }
    }

    prompt.push_str(REWRITE_INSTRUCTIONS);

    if request.language == Language::German {
        prompt.push_str(GERMAN_DIRECTIVE);
    }

    prompt
}
