//! Core data models for the song similarity graph.
//!
//! This module contains the song record types, the fixed set of numeric
//! attributes scored by the engine, and the statistics reported by the graph.

use serde::Serialize;
use std::fmt;

use crate::normalize::normalize_key;

// ============================================================================
// Numeric Attributes
// ============================================================================

/// Number of numeric attributes carried by every song.
pub const NUMERIC_ATTRIBUTE_COUNT: usize = 11;

/// Numeric song attributes, in catalog column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericAttribute {
    Year,
    Bpm,
    Energy,
    Danceability,
    Loudness,
    Liveness,
    Valence,
    Length,
    Acousticness,
    Speechiness,
    Popularity,
}

impl NumericAttribute {
    pub const ALL: [NumericAttribute; NUMERIC_ATTRIBUTE_COUNT] = [
        NumericAttribute::Year,
        NumericAttribute::Bpm,
        NumericAttribute::Energy,
        NumericAttribute::Danceability,
        NumericAttribute::Loudness,
        NumericAttribute::Liveness,
        NumericAttribute::Valence,
        NumericAttribute::Length,
        NumericAttribute::Acousticness,
        NumericAttribute::Speechiness,
        NumericAttribute::Popularity,
    ];

    /// Position of this attribute in a value array.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericAttribute::Year => "year",
            NumericAttribute::Bpm => "bpm",
            NumericAttribute::Energy => "energy",
            NumericAttribute::Danceability => "danceability",
            NumericAttribute::Loudness => "loudness",
            NumericAttribute::Liveness => "liveness",
            NumericAttribute::Valence => "valence",
            NumericAttribute::Length => "length",
            NumericAttribute::Acousticness => "acousticness",
            NumericAttribute::Speechiness => "speechiness",
            NumericAttribute::Popularity => "popularity",
        }
    }
}

impl fmt::Display for NumericAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything that exposes a value for every numeric attribute.
/// Implemented by raw loader rows and by catalog songs, so ranges can be
/// computed from either.
pub trait AttributeValues {
    fn value(&self, attr: NumericAttribute) -> f64;
}

// ============================================================================
// Loader Rows
// ============================================================================

/// One parsed catalog row, as supplied by the loader.
/// Strings are kept as read; normalization happens on catalog insertion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SongRow {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub year: f64,
    pub bpm: f64,
    pub energy: f64,
    pub danceability: f64,
    pub loudness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub length: f64,
    pub acousticness: f64,
    pub speechiness: f64,
    pub popularity: f64,
}

impl SongRow {
    pub fn set_value(&mut self, attr: NumericAttribute, value: f64) {
        let slot = match attr {
            NumericAttribute::Year => &mut self.year,
            NumericAttribute::Bpm => &mut self.bpm,
            NumericAttribute::Energy => &mut self.energy,
            NumericAttribute::Danceability => &mut self.danceability,
            NumericAttribute::Loudness => &mut self.loudness,
            NumericAttribute::Liveness => &mut self.liveness,
            NumericAttribute::Valence => &mut self.valence,
            NumericAttribute::Length => &mut self.length,
            NumericAttribute::Acousticness => &mut self.acousticness,
            NumericAttribute::Speechiness => &mut self.speechiness,
            NumericAttribute::Popularity => &mut self.popularity,
        };
        *slot = value;
    }
}

impl AttributeValues for SongRow {
    fn value(&self, attr: NumericAttribute) -> f64 {
        match attr {
            NumericAttribute::Year => self.year,
            NumericAttribute::Bpm => self.bpm,
            NumericAttribute::Energy => self.energy,
            NumericAttribute::Danceability => self.danceability,
            NumericAttribute::Loudness => self.loudness,
            NumericAttribute::Liveness => self.liveness,
            NumericAttribute::Valence => self.valence,
            NumericAttribute::Length => self.length,
            NumericAttribute::Acousticness => self.acousticness,
            NumericAttribute::Speechiness => self.speechiness,
            NumericAttribute::Popularity => self.popularity,
        }
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

/// Song identity: normalized (title, artist).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SongKey {
    pub title: String,
    pub artist: String,
}

impl SongKey {
    /// Build a key from user-facing strings, normalizing both parts.
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            title: normalize_key(title),
            artist: normalize_key(artist),
        }
    }
}

impl fmt::Display for SongKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Immutable catalog entry. Fields are private so a song cannot change
/// after it has been scored.
#[derive(Clone, Debug)]
pub struct Song {
    key: SongKey,
    genre: String,
    values: [f64; NUMERIC_ATTRIBUTE_COUNT],
}

impl Song {
    pub fn from_row(row: &SongRow) -> Self {
        let mut values = [0.0; NUMERIC_ATTRIBUTE_COUNT];
        for attr in NumericAttribute::ALL {
            values[attr.index()] = row.value(attr);
        }
        Self {
            key: SongKey::new(&row.title, &row.artist),
            genre: normalize_key(&row.genre),
            values,
        }
    }

    pub fn key(&self) -> &SongKey {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.key.title
    }

    pub fn artist(&self) -> &str {
        &self.key.artist
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }
}

impl AttributeValues for Song {
    fn value(&self, attr: NumericAttribute) -> f64 {
        self.values[attr.index()]
    }
}

/// A recommended song with the score that ranked it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub song: SongKey,
    pub score: f64,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Counters describing the graph and how its edge cache has been used.
#[derive(Default, Debug, Clone, Serialize)]
pub struct GraphStats {
    pub songs: usize,
    pub cached_edges: usize,
    pub queries: usize,
    pub fast_path_queries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl GraphStats {
    /// Share of edge lookups answered from cache, as a percentage
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            100.0 * self.cache_hits as f64 / lookups as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_indices_follow_column_order() {
        for (i, attr) in NumericAttribute::ALL.iter().enumerate() {
            assert_eq!(attr.index(), i);
        }
        assert_eq!(NumericAttribute::Length.name(), "length");
    }

    #[test]
    fn test_song_from_row_normalizes_identity() {
        let row = SongRow {
            title: "Bohemian Rhapsody".to_string(),
            artist: "Queen".to_string(),
            genre: "Glam Rock".to_string(),
            bpm: 71.0,
            popularity: 80.0,
            ..Default::default()
        };
        let song = Song::from_row(&row);
        assert_eq!(song.title(), "bohemian rhapsody");
        assert_eq!(song.artist(), "queen");
        assert_eq!(song.genre(), "glam rock");
        assert_eq!(song.value(NumericAttribute::Bpm), 71.0);
        assert_eq!(song.value(NumericAttribute::Popularity), 80.0);
        assert_eq!(song.key(), &SongKey::new("BOHEMIAN RHAPSODY", "queen"));
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = GraphStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        stats.cache_hits = 3;
        stats.cache_misses = 1;
        assert_eq!(stats.hit_rate(), 75.0);
    }
}
