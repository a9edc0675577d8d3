use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{DataError, Result};

/// Lowercased, whitespace-trimmed form of a title, used as lookup key.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// A single movie loaded from the catalog source. Immutable after load.
#[derive(Debug, Clone)]
pub struct MovieRecord {
    /// Display form of the title (trimmed, original casing).
    pub title: String,
    pub synopsis: String,
    /// Comma-separated tag list, e.g. `"Drama, Sci-Fi"`.
    pub genre: String,
    pub review_text: String,
}

/// Row shape of the catalog source; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    title: String,
    #[serde(default)]
    synopsis: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    review_text: String,
}

/// Read-only movie catalog keyed by normalized title.
pub struct CatalogStore {
    records: HashMap<String, MovieRecord>,
    titles: Vec<String>,
}

impl CatalogStore {
    /// Load the catalog from a CSV source. Any read or parse failure is
    /// fatal; the store is never partially loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut reader = csv::Reader::from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize::<CatalogRow>() {
            let row = row.map_err(|source| DataError::Csv {
                path: path.display().to_string(),
                source,
            })?;
            let title = row.title.trim();
            if title.is_empty() {
                continue;
            }
            records.push(MovieRecord {
                title: title.to_string(),
                synopsis: row.synopsis,
                genre: row.genre,
                review_text: row.review_text,
            });
        }

        let store = Self::from_records(records);
        info!(path = %path.display(), titles = store.len(), "catalog loaded");
        Ok(store)
    }

    /// Build a store from in-memory records. The first record for a
    /// normalized title wins; later duplicates are dropped.
    pub fn from_records(records: impl IntoIterator<Item = MovieRecord>) -> Self {
        let mut map = HashMap::new();
        let mut titles = Vec::new();
        for record in records {
            let key = normalize_title(&record.title);
            if key.is_empty() {
                continue;
            }
            if let Entry::Vacant(slot) = map.entry(key) {
                titles.push(record.title.clone());
                slot.insert(record);
            }
        }
        Self {
            records: map,
            titles,
        }
    }

    /// Look up a movie by title. Matching is exact on the normalized key,
    /// so lookups are case- and surrounding-whitespace-insensitive.
    pub fn lookup(&self, title: &str) -> Option<&MovieRecord> {
        self.records.get(&normalize_title(title))
    }

    /// Distinct known titles in display form, for UI selection.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Sorted distinct set of individual genre tags across the catalog.
    pub fn genre_tags(&self) -> Vec<String> {
        let mut tags = BTreeSet::new();
        for record in self.records.values() {
            for tag in record.genre.split(',') {
                let tag = tag.trim();
                if !tag.is_empty() {
                    tags.insert(tag.to_string());
                }
            }
        }
        tags.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_store() -> CatalogStore {
        CatalogStore::from_records(vec![
            MovieRecord {
                title: "The Matrix".to_string(),
                synopsis: "A hacker discovers reality is a simulation.".to_string(),
                genre: "Action, Sci-Fi".to_string(),
                review_text: "Mind-bending.".to_string(),
            },
            MovieRecord {
                title: "Heat".to_string(),
                synopsis: "A thief and a detective circle each other.".to_string(),
                genre: "Crime, Drama".to_string(),
                review_text: String::new(),
            },
        ])
    }

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        let store = sample_store();
        let a = store.lookup(" The Matrix ").unwrap();
        let b = store.lookup("the matrix").unwrap();
        assert_eq!(a.title, "The Matrix");
        assert_eq!(a.synopsis, b.synopsis);
    }

    #[test]
    fn unknown_title_is_absent() {
        assert!(sample_store().lookup("Solaris").is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let store = CatalogStore::from_records(vec![
            MovieRecord {
                title: "Heat".to_string(),
                synopsis: "first".to_string(),
                genre: String::new(),
                review_text: String::new(),
            },
            MovieRecord {
                title: "HEAT".to_string(),
                synopsis: "second".to_string(),
                genre: String::new(),
                review_text: String::new(),
            },
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("heat").unwrap().synopsis, "first");
    }

    #[test]
    fn genre_tags_are_sorted_and_distinct() {
        let tags = sample_store().genre_tags();
        assert_eq!(tags, vec!["Action", "Crime", "Drama", "Sci-Fi"]);
    }

    #[test]
    fn loads_csv_with_extra_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title,year,synopsis,genre,review_text,vector").unwrap();
        writeln!(
            file,
            " Inception ,2010,A thief enters dreams.,\"Action, Sci-Fi\",Stunning.,ignored"
        )
        .unwrap();
        writeln!(file, ",1999,no title row,Drama,,x").unwrap();

        let store = CatalogStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.titles(), ["Inception"]);
        let record = store.lookup("inception").unwrap();
        assert_eq!(record.synopsis, "A thief enters dreams.");
        assert_eq!(record.genre, "Action, Sci-Fi");
    }

    #[test]
    fn missing_source_is_fatal() {
        assert!(CatalogStore::load("/nonexistent/catalog.csv").is_err());
    }
}
