//! Similarity graph with a lazily populated edge cache.
//!
//! Songs are vertices addressed by their catalog index. Edges are similarity
//! scores, computed the first time a query needs them and cached for the
//! lifetime of the graph. The catalog never changes, so a cached score is
//! never stale.

use indicatif::ProgressBar;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::catalog::{Catalog, SongIndex};
use crate::error::CatalogError;
use crate::models::{GraphStats, Recommendation, SongKey, SongRow};
use crate::normalize::normalize_key;
use crate::ranges::PropertyRangeIndex;
use crate::scoring::ScoringStrategy;

// ============================================================================
// Edge Cache
// ============================================================================

/// Unordered pair of distinct songs, stored as (smaller, larger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(SongIndex, SongIndex);

impl EdgeKey {
    /// Panics if `a == b`: a song has no edge to itself, and callers are
    /// expected to filter the queried song out before asking for one.
    pub fn new(a: SongIndex, b: SongIndex) -> Self {
        assert_ne!(a, b, "similarity edge requested between a song and itself");
        if a < b {
            EdgeKey(a, b)
        } else {
            EdgeKey(b, a)
        }
    }

    pub fn endpoints(self) -> (SongIndex, SongIndex) {
        (self.0, self.1)
    }
}

/// Memoized similarity scores. Only ever grows.
#[derive(Debug, Default)]
pub struct EdgeCache {
    scores: FxHashMap<EdgeKey, f64>,
    /// Number of cached edges touching each song
    degree: Vec<usize>,
}

impl EdgeCache {
    pub fn with_songs(song_count: usize) -> Self {
        Self {
            scores: FxHashMap::default(),
            degree: vec![0; song_count],
        }
    }

    pub fn get(&self, key: EdgeKey) -> Option<f64> {
        self.scores.get(&key).copied()
    }

    /// Record a score. An existing entry is kept as is.
    pub fn insert(&mut self, key: EdgeKey, score: f64) {
        if self.scores.contains_key(&key) {
            return;
        }
        self.scores.insert(key, score);
        let (a, b) = key.endpoints();
        self.degree[a] += 1;
        self.degree[b] += 1;
    }

    pub fn degree(&self, song: SongIndex) -> usize {
        self.degree[song]
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

// ============================================================================
// Similarity Graph
// ============================================================================

/// Catalog, property ranges and edge cache, plus the recommendation query.
///
/// Queries take `&mut self` because a read may add edges to the cache.
/// Share a graph across threads by wrapping it in a `Mutex`; scores are
/// deterministic, so two queries racing to fill the same edge store the
/// same value.
#[derive(Debug)]
pub struct SimilarityGraph {
    catalog: Catalog,
    ranges: PropertyRangeIndex,
    strategy: ScoringStrategy,
    edges: EdgeCache,
    stats: GraphStats,
}

impl SimilarityGraph {
    pub fn new(catalog: Catalog, ranges: PropertyRangeIndex) -> Self {
        Self::with_strategy(catalog, ranges, ScoringStrategy::default())
    }

    pub fn with_strategy(
        catalog: Catalog,
        ranges: PropertyRangeIndex,
        strategy: ScoringStrategy,
    ) -> Self {
        let edges = EdgeCache::with_songs(catalog.len());
        let stats = GraphStats {
            songs: catalog.len(),
            ..Default::default()
        };
        info!(songs = catalog.len(), ?strategy, "similarity graph ready");
        Self {
            catalog,
            ranges,
            strategy,
            edges,
            stats,
        }
    }

    /// Build ranges from every row (duplicates included), then the catalog.
    pub fn from_rows(rows: &[SongRow], strategy: ScoringStrategy) -> Result<Self, CatalogError> {
        let ranges = PropertyRangeIndex::build(rows)?;
        let catalog = Catalog::from_rows(rows);
        Ok(Self::with_strategy(catalog, ranges, strategy))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ranges(&self) -> &PropertyRangeIndex {
        &self.ranges
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    pub fn cached_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            cached_edges: self.edges.len(),
            ..self.stats.clone()
        }
    }

    /// Cached score between two songs, computing and caching it on a miss.
    ///
    /// Panics if `a == b` or either index is outside the catalog.
    pub fn get_or_compute_similarity(&mut self, a: SongIndex, b: SongIndex) -> f64 {
        let key = EdgeKey::new(a, b);
        if let Some(score) = self.edges.get(key) {
            self.stats.cache_hits += 1;
            return score;
        }

        let score = self
            .strategy
            .score(&self.catalog[a], &self.catalog[b], &self.ranges);
        self.edges.insert(key, score);
        self.stats.cache_misses += 1;
        score
    }

    /// Similarity between two songs named by title and artist.
    /// `None` if either is unknown or both name the same song.
    pub fn similarity(
        &mut self,
        title_a: &str,
        artist_a: &str,
        title_b: &str,
        artist_b: &str,
    ) -> Option<f64> {
        let a = self.catalog.index_of(title_a, artist_a)?;
        let b = self.catalog.index_of(title_b, artist_b)?;
        if a == b {
            return None;
        }
        Some(self.get_or_compute_similarity(a, b))
    }

    /// Songs most similar to (title, artist), best first.
    ///
    /// At most `max_results` songs, each scoring at least `threshold`. Songs
    /// with equal scores keep catalog order. An unknown song yields an empty
    /// list.
    pub fn recommend(
        &mut self,
        title: &str,
        artist: &str,
        max_results: usize,
        threshold: f64,
    ) -> Vec<SongKey> {
        self.recommend_scored(title, artist, max_results, threshold)
            .into_iter()
            .map(|r| r.song)
            .collect()
    }

    /// Same as [`recommend`](Self::recommend), keeping the scores.
    pub fn recommend_scored(
        &mut self,
        title: &str,
        artist: &str,
        max_results: usize,
        threshold: f64,
    ) -> Vec<Recommendation> {
        if !self
            .catalog
            .find_artists_by_title(title)
            .contains(&normalize_key(artist))
        {
            debug!(title, artist, "no such song");
            return Vec::new();
        }
        let Some(index) = self.catalog.index_of(title, artist) else {
            return Vec::new();
        };

        self.stats.queries += 1;
        let candidates = self.score_neighbors(index);
        let ranked = rank_candidates(candidates, max_results, threshold);
        debug!(title, artist, results = ranked.len(), "recommendation query");

        ranked
            .into_iter()
            .map(|(i, score)| Recommendation {
                song: self.catalog[i].key().clone(),
                score,
            })
            .collect()
    }

    /// Score of every other song against `index`, in catalog order.
    fn score_neighbors(&mut self, index: SongIndex) -> Vec<(SongIndex, f64)> {
        let others = self.catalog.len() - 1;

        // Fast path: every edge from this song is already cached
        if self.edges.degree(index) == others {
            self.stats.fast_path_queries += 1;
            self.stats.cache_hits += others;
            return (0..self.catalog.len())
                .filter(|&other| other != index)
                .filter_map(|other| {
                    self.edges
                        .get(EdgeKey::new(index, other))
                        .map(|score| (other, score))
                })
                .collect();
        }

        let mut candidates = Vec::with_capacity(others);
        for other in 0..self.catalog.len() {
            if other == index {
                continue;
            }
            let score = self.get_or_compute_similarity(index, other);
            candidates.push((other, score));
        }
        candidates
    }

    /// Compute every missing edge in parallel, then cache the results.
    /// Returns the number of edges added. Afterwards every query takes the
    /// fast path.
    pub fn warm_cache(&mut self, pb: Option<&ProgressBar>) -> usize {
        let n = self.catalog.len();
        let catalog = &self.catalog;
        let ranges = &self.ranges;
        let edges = &self.edges;
        let strategy = self.strategy;

        let missing: Vec<(EdgeKey, f64)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|a| {
                if let Some(pb) = pb {
                    pb.inc(1);
                }
                ((a + 1)..n).filter_map(move |b| {
                    let key = EdgeKey::new(a, b);
                    if edges.get(key).is_some() {
                        return None;
                    }
                    Some((key, strategy.score(&catalog[a], &catalog[b], ranges)))
                })
            })
            .collect();

        let added = missing.len();
        for (key, score) in missing {
            self.edges.insert(key, score);
        }
        self.stats.cache_misses += added;
        debug!(added, total = self.edges.len(), "edge cache warmed");
        added
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// Order by descending score, then by catalog position. Equal scores compare
/// equal, so earlier songs win ties.
fn by_rank(a: &(SongIndex, f64), b: &(SongIndex, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

/// Keep candidates scoring at least `threshold`, then the best
/// `max_results` of them in rank order.
///
/// Uses partial selection so only the kept prefix is fully sorted. The
/// result is the same as inserting each candidate before the first entry
/// with a strictly lower score and taking the front of that list.
fn rank_candidates(
    mut candidates: Vec<(SongIndex, f64)>,
    max_results: usize,
    threshold: f64,
) -> Vec<(SongIndex, f64)> {
    if max_results == 0 {
        return Vec::new();
    }
    candidates.retain(|&(_, score)| score >= threshold);
    if candidates.len() > max_results {
        candidates.select_nth_unstable_by(max_results - 1, by_rank);
        candidates.truncate(max_results);
    }
    candidates.sort_by(by_rank);
    candidates
}
