//! Catalog loader for the Spotify top-songs CSV export.
//!
//! Expected layout (header row first, columns by position):
//!
//! | col | field        | col | field        |
//! |-----|--------------|-----|--------------|
//! | 0   | index        | 8   | loudness     |
//! | 1   | title        | 9   | liveness     |
//! | 2   | artist       | 10  | valence      |
//! | 3   | genre        | 11  | length       |
//! | 4   | year         | 12  | acousticness |
//! | 5   | bpm          | 13  | speechiness  |
//! | 6   | energy       | 14  | popularity   |
//! | 7   | danceability |     |              |
//!
//! Numeric fields may carry thousands separators ("1,412" seconds); they are
//! stripped before parsing.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::CatalogError;
use crate::graph::SimilarityGraph;
use crate::models::{NumericAttribute, SongRow};
use crate::normalize::strip_thousands_separators;
use crate::scoring::ScoringStrategy;

const TITLE_COLUMN: usize = 1;
const ARTIST_COLUMN: usize = 2;
const GENRE_COLUMN: usize = 3;
const FIRST_NUMERIC_COLUMN: usize = 4;

fn numeric_column(attr: NumericAttribute) -> usize {
    FIRST_NUMERIC_COLUMN + attr.index()
}

fn text_field<'r>(
    record: &'r StringRecord,
    column: usize,
    field: &'static str,
    line: u64,
) -> Result<&'r str, CatalogError> {
    record
        .get(column)
        .ok_or(CatalogError::MissingField { line, field })
}

fn numeric_field(
    record: &StringRecord,
    attr: NumericAttribute,
    line: u64,
) -> Result<f64, CatalogError> {
    let raw = text_field(record, numeric_column(attr), attr.name(), line)?;
    match strip_thousands_separators(raw).parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CatalogError::AttributeParse {
            line,
            field: attr.name(),
            value: raw.to_string(),
        }),
    }
}

fn parse_record(record: &StringRecord) -> Result<SongRow, CatalogError> {
    let line = record.position().map_or(0, |p| p.line());

    let mut row = SongRow {
        title: text_field(record, TITLE_COLUMN, "title", line)?.to_string(),
        artist: text_field(record, ARTIST_COLUMN, "artist", line)?.to_string(),
        genre: text_field(record, GENRE_COLUMN, "genre", line)?.to_string(),
        ..Default::default()
    };
    for attr in NumericAttribute::ALL {
        row.set_value(attr, numeric_field(record, attr, line)?);
    }
    Ok(row)
}

/// Parse every data row. Fails on the first malformed row.
pub fn load_rows<R: Read>(reader: R) -> Result<Vec<SongRow>, CatalogError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        rows.push(parse_record(&record?)?);
    }
    Ok(rows)
}

pub fn load_rows_from_path(path: &Path) -> Result<Vec<SongRow>, CatalogError> {
    let file = File::open(path)?;
    let rows = load_rows(file)?;
    info!(path = %path.display(), rows = rows.len(), "catalog file read");
    Ok(rows)
}

/// Read a catalog file and build the graph over it.
pub fn build_graph(path: &Path, strategy: ScoringStrategy) -> Result<SimilarityGraph, CatalogError> {
    let rows = load_rows_from_path(path)?;
    SimilarityGraph::from_rows(&rows, strategy)
}
