//! Error type shared by the catalog loader and the range index.

use thiserror::Error;

/// Errors raised while turning catalog rows into a similarity graph.
///
/// Unknown songs, duplicate rows and constant attributes are not errors;
/// they are handled as ordinary outcomes by the catalog and the graph.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Property ranges are undefined without at least one row.
    #[error("cannot compute property ranges from an empty catalog")]
    EmptyCatalog,

    #[error("line {line}: cannot parse {field} value {value:?}")]
    AttributeParse {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: missing {field} column")]
    MissingField { line: u64, field: &'static str },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
