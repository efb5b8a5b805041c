//! Immutable song catalog keyed by normalized (title, artist).

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::info;

use crate::models::{Song, SongKey, SongRow};
use crate::normalize::normalize_key;

/// Stable position of a song in the catalog arena.
pub type SongIndex = usize;

/// Index mapping (title_norm, artist_norm) to position in the song arena
pub type SongKeyIndex = FxHashMap<SongKey, SongIndex>;

/// Title-only index for artist lookups by title
pub type TitleIndex = FxHashMap<String, Vec<SongIndex>>;

/// Songs in insertion order plus the lookup indexes over them.
///
/// Insertion order is the iteration order and is what breaks ties between
/// equally scored recommendations, so it never changes once a song is in.
#[derive(Debug, Default)]
pub struct Catalog {
    songs: Vec<Song>,
    by_key: SongKeyIndex,
    by_title: TitleIndex,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from loader rows; later duplicates are ignored.
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a SongRow>,
    {
        let mut catalog = Self::new();
        let mut duplicates = 0usize;
        for row in rows {
            if !catalog.insert(row) {
                duplicates += 1;
            }
        }
        info!(songs = catalog.len(), duplicates, "catalog built");
        catalog
    }

    /// Insert a song. Returns false, leaving the catalog untouched, when a
    /// song with the same normalized identity is already present.
    pub fn insert(&mut self, row: &SongRow) -> bool {
        let song = Song::from_row(row);
        if self.by_key.contains_key(song.key()) {
            return false;
        }

        let index = self.songs.len();
        self.by_key.insert(song.key().clone(), index);
        self.by_title
            .entry(song.title().to_string())
            .or_default()
            .push(index);
        self.songs.push(song);
        true
    }

    /// Artists that have a song with this title. Empty if the title is unknown.
    pub fn find_artists_by_title(&self, title: &str) -> BTreeSet<String> {
        self.by_title
            .get(&normalize_key(title))
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| self.songs[i].artist().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn index_of(&self, title: &str, artist: &str) -> Option<SongIndex> {
        self.by_key.get(&SongKey::new(title, artist)).copied()
    }

    pub fn get(&self, title: &str, artist: &str) -> Option<&Song> {
        self.index_of(title, artist).map(|i| &self.songs[i])
    }

    pub fn song(&self, index: SongIndex) -> Option<&Song> {
        self.songs.get(index)
    }

    /// Distinct normalized titles, in no particular order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.by_title.keys().map(String::as_str)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Song> {
        self.songs.iter()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

impl std::ops::Index<SongIndex> for Catalog {
    type Output = Song;

    fn index(&self, index: SongIndex) -> &Song {
        &self.songs[index]
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Song;
    type IntoIter = std::slice::Iter<'a, Song>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeValues, NumericAttribute};

    fn row(title: &str, artist: &str, bpm: f64) -> SongRow {
        SongRow {
            title: title.to_string(),
            artist: artist.to_string(),
            genre: "pop".to_string(),
            bpm,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(&row("Yesterday", "The Beatles", 97.0)));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.index_of("yesterday", "the beatles"), Some(0));
        assert!(catalog.get("YESTERDAY", "The Beatles").is_some());
        assert!(catalog.get("Yesterday", "Boyz II Men").is_none());
    }

    #[test]
    fn test_duplicate_insert_keeps_first() {
        let mut catalog = Catalog::new();
        assert!(catalog.insert(&row("Yesterday", "The Beatles", 97.0)));
        assert!(!catalog.insert(&row("yesterday", "the beatles", 140.0)));
        assert_eq!(catalog.len(), 1);
        let song = catalog.get("Yesterday", "The Beatles").unwrap();
        assert_eq!(song.value(NumericAttribute::Bpm), 97.0);
    }

    #[test]
    fn test_find_artists_by_title() {
        let catalog = Catalog::from_rows(&[
            row("Yesterday", "The Beatles", 97.0),
            row("Yesterday", "Boyz II Men", 70.0),
            row("Hey Jude", "The Beatles", 74.0),
        ]);
        let artists = catalog.find_artists_by_title("YESTERDAY");
        let expected: BTreeSet<String> = ["boyz ii men", "the beatles"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(artists, expected);
        assert!(catalog.find_artists_by_title("Let It Be").is_empty());
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let catalog = Catalog::from_rows(&[
            row("C", "x", 1.0),
            row("A", "x", 2.0),
            row("B", "x", 3.0),
            row("a", "X", 4.0),
        ]);
        let titles: Vec<&str> = catalog.iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
        assert_eq!(catalog.song(1).map(|s| s.title()), Some("a"));
        assert!(catalog.song(3).is_none());
    }
}
