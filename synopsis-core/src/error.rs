use thiserror::Error;

/// Errors raised while loading the catalog and similarity data sources.
///
/// These are load-time failures only: the stores cannot be built without
/// their sources, so callers are expected to abort startup on any of them.
/// Query-time absence ("unknown title") is expressed with `Option`/empty
/// results, never with this type.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid list literal {literal:?}: {reason}")]
    ListLiteral { literal: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DataError>;
