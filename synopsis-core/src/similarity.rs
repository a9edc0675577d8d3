use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::{normalize_title, CatalogStore};
use crate::error::{DataError, Result};
use crate::literal::{parse_number_list, parse_string_list};

/// Sentinel genre for similar titles that are missing from the catalog.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Precomputed ranked list of similar titles for one source title.
/// `ranked_similar` is pre-sorted by descending similarity; the order is
/// significant and preserved verbatim.
#[derive(Debug, Clone)]
pub struct SimilarityEntry {
    pub source_title: String,
    pub ranked_similar: Vec<(String, f64)>,
}

/// One recommended movie returned from a top-N query. The first element of
/// a result sequence is the primary recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub title: String,
    pub similarity_score: f64,
    pub genre: String,
}

/// Row shape of the similarity source. The list-valued columns carry the
/// textual literal syntax written at precomputation time.
#[derive(Debug, Deserialize)]
struct SimilarityRow {
    movie: String,
    top_similar_movies: String,
    similarity_scores: String,
}

/// Read-only index over the precomputed similarity data, keyed by
/// normalized source title.
pub struct SimilarityIndex {
    entries: HashMap<String, SimilarityEntry>,
}

impl SimilarityIndex {
    /// Load the index from a CSV source. Malformed rows or list literals are
    /// fatal here, never deferred to query time.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let mut entries = Vec::new();
        for row in reader.deserialize::<SimilarityRow>() {
            let row = row.map_err(|source| DataError::Csv {
                path: path.display().to_string(),
                source,
            })?;
            let titles = parse_string_list(&row.top_similar_movies)?;
            let scores = parse_number_list(&row.similarity_scores)?;
            entries.push(SimilarityEntry {
                source_title: row.movie,
                // Pairing stops at the shorter column, matching the
                // precomputation's own zip of the two lists.
                ranked_similar: titles.into_iter().zip(scores).collect(),
            });
        }

        let index = Self::from_entries(entries);
        info!(path = %path.display(), entries = index.len(), "similarity index loaded");
        Ok(index)
    }

    /// Build an index from in-memory entries, normalizing source titles.
    pub fn from_entries(entries: impl IntoIterator<Item = SimilarityEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (normalize_title(&entry.source_title), entry))
            .collect();
        Self { entries }
    }

    /// Top `n` similar movies for `title`, in precomputed order.
    ///
    /// An unknown title yields an empty sequence: "no recommendation
    /// available" is a valid state the caller must handle, not an error.
    /// Entries are passed through as stored, with no re-sorting and no
    /// de-duplication (a title listing itself as similar stays in). Genres
    /// are resolved against the catalog, falling back to [`UNKNOWN_GENRE`]
    /// for titles the catalog does not know.
    pub fn top_similar(
        &self,
        title: &str,
        n: usize,
        catalog: &CatalogStore,
    ) -> Vec<RecommendationResult> {
        let Some(entry) = self.entries.get(&normalize_title(title)) else {
            return Vec::new();
        };

        entry
            .ranked_similar
            .iter()
            .take(n)
            .map(|(similar_title, score)| RecommendationResult {
                title: similar_title.clone(),
                similarity_score: *score,
                genre: catalog
                    .lookup(similar_title)
                    .map(|record| record.genre.clone())
                    .unwrap_or_else(|| UNKNOWN_GENRE.to_string()),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MovieRecord;
    use std::io::Write;

    fn catalog() -> CatalogStore {
        CatalogStore::from_records(vec![
            MovieRecord {
                title: "Interstellar".to_string(),
                synopsis: "Explorers travel through a wormhole.".to_string(),
                genre: "Adventure, Sci-Fi".to_string(),
                review_text: String::new(),
            },
            MovieRecord {
                title: "Arrival".to_string(),
                synopsis: "A linguist decodes an alien language.".to_string(),
                genre: "Drama, Sci-Fi".to_string(),
                review_text: String::new(),
            },
        ])
    }

    fn index() -> SimilarityIndex {
        SimilarityIndex::from_entries(vec![SimilarityEntry {
            source_title: "Inception".to_string(),
            ranked_similar: vec![
                ("Interstellar".to_string(), 0.93),
                ("Arrival".to_string(), 0.88),
                ("Lost Highway".to_string(), 0.71),
            ],
        }])
    }

    #[test]
    fn preserves_precomputed_order_and_truncates_to_n() {
        let results = index().top_similar("Inception", 2, &catalog());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Interstellar");
        assert_eq!(results[0].similarity_score, 0.93);
        assert_eq!(results[1].title, "Arrival");
        assert!(results[0].similarity_score >= results[1].similarity_score);
    }

    #[test]
    fn unknown_title_yields_empty_sequence() {
        assert!(index().top_similar("Solaris", 5, &catalog()).is_empty());
    }

    #[test]
    fn short_lists_are_returned_whole() {
        let results = index().top_similar(" INCEPTION ", 5, &catalog());
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn missing_catalog_entry_falls_back_to_unknown_genre() {
        let results = index().top_similar("Inception", 3, &catalog());
        assert_eq!(results[2].title, "Lost Highway");
        assert_eq!(results[2].genre, UNKNOWN_GENRE);
    }

    #[test]
    fn self_similarity_passes_through() {
        let index = SimilarityIndex::from_entries(vec![SimilarityEntry {
            source_title: "Arrival".to_string(),
            ranked_similar: vec![
                ("Arrival".to_string(), 1.0),
                ("Interstellar".to_string(), 0.9),
            ],
        }]);
        let results = index.top_similar("Arrival", 5, &catalog());
        assert_eq!(results[0].title, "Arrival");
        assert_eq!(results[0].similarity_score, 1.0);
    }

    #[test]
    fn loads_literal_encoded_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movie,top_similar_movies,similarity_scores").unwrap();
        writeln!(
            file,
            r#"Inception,"['Interstellar', 'The Good, the Bad and the Ugly']","[0.93, 0.7]""#
        )
        .unwrap();

        let index = SimilarityIndex::load(file.path()).unwrap();
        let results = index.top_similar("inception", 5, &catalog());
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].title, "The Good, the Bad and the Ugly");
        assert_eq!(results[1].similarity_score, 0.7);
    }

    #[test]
    fn malformed_literals_fail_at_load_time() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movie,top_similar_movies,similarity_scores").unwrap();
        writeln!(file, r#"Inception,"[broken","[0.93]""#).unwrap();
        assert!(SimilarityIndex::load(file.path()).is_err());
    }
}
