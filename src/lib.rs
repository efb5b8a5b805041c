//! Song similarity graph - catalog, property ranges, scoring and
//! recommendation queries shared by the command-line front end.

pub mod catalog;
pub mod error;
pub mod graph;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod ranges;
pub mod scoring;
pub mod session;

pub use catalog::{Catalog, SongIndex};
pub use error::CatalogError;
pub use graph::SimilarityGraph;
pub use models::{Recommendation, Song, SongKey, SongRow};
pub use ranges::PropertyRangeIndex;
pub use scoring::ScoringStrategy;
