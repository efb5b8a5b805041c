//! Catalog-wide value ranges used to normalize attribute differences.

use tracing::debug;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::models::{AttributeValues, NumericAttribute, NUMERIC_ATTRIBUTE_COUNT};

/// Range (max - min) of every numeric attribute across a catalog.
///
/// Built once from an explicit set of rows and never mutated. A zero range
/// means the attribute is constant across the catalog; the scorer treats
/// that as a perfect match instead of dividing by it.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyRangeIndex {
    ranges: [f64; NUMERIC_ATTRIBUTE_COUNT],
}

impl PropertyRangeIndex {
    /// Scan `rows` once, tracking the running minimum and maximum of each
    /// numeric attribute.
    pub fn build<'a, T, I>(rows: I) -> Result<Self, CatalogError>
    where
        T: AttributeValues + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut min = [f64::INFINITY; NUMERIC_ATTRIBUTE_COUNT];
        let mut max = [f64::NEG_INFINITY; NUMERIC_ATTRIBUTE_COUNT];
        let mut count = 0usize;

        for row in rows {
            for attr in NumericAttribute::ALL {
                let i = attr.index();
                let value = row.value(attr);
                min[i] = min[i].min(value);
                max[i] = max[i].max(value);
            }
            count += 1;
        }

        if count == 0 {
            return Err(CatalogError::EmptyCatalog);
        }

        let ranges = std::array::from_fn(|i| max[i] - min[i]);

        debug!(rows = count, "computed property ranges");
        Ok(Self { ranges })
    }

    pub fn from_catalog(catalog: &Catalog) -> Result<Self, CatalogError> {
        Self::build(catalog.iter())
    }

    pub fn range(&self, attr: NumericAttribute) -> f64 {
        self.ranges[attr.index()]
    }

    /// (attribute, range) pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (NumericAttribute, f64)> + '_ {
        NumericAttribute::ALL
            .into_iter()
            .map(move |attr| (attr, self.range(attr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SongRow;

    fn row(bpm: f64, year: f64) -> SongRow {
        SongRow {
            title: format!("song {}", bpm),
            artist: "artist".to_string(),
            bpm,
            year,
            ..Default::default()
        }
    }

    #[test]
    fn test_build_computes_max_minus_min() {
        let rows = vec![row(120.0, 1990.0), row(80.0, 2005.0), row(200.0, 1999.0)];
        let ranges = PropertyRangeIndex::build(&rows).unwrap();
        assert_eq!(ranges.range(NumericAttribute::Bpm), 120.0);
        assert_eq!(ranges.range(NumericAttribute::Year), 15.0);
    }

    #[test]
    fn test_decreasing_values_still_track_max() {
        // The first value is the maximum; min and max are tracked independently.
        let rows = vec![row(200.0, 2000.0), row(150.0, 2000.0), row(100.0, 2000.0)];
        let ranges = PropertyRangeIndex::build(&rows).unwrap();
        assert_eq!(ranges.range(NumericAttribute::Bpm), 100.0);
    }

    #[test]
    fn test_constant_attribute_has_zero_range() {
        let rows = vec![row(120.0, 2000.0), row(90.0, 2000.0)];
        let ranges = PropertyRangeIndex::build(&rows).unwrap();
        assert_eq!(ranges.range(NumericAttribute::Year), 0.0);
        assert_eq!(ranges.range(NumericAttribute::Popularity), 0.0);
    }

    #[test]
    fn test_single_row_gives_all_zero_ranges() {
        let rows = vec![row(120.0, 2000.0)];
        let ranges = PropertyRangeIndex::build(&rows).unwrap();
        assert!(ranges.iter().all(|(_, r)| r == 0.0));
    }

    #[test]
    fn test_empty_rows_fail() {
        let rows: Vec<SongRow> = Vec::new();
        let result = PropertyRangeIndex::build(&rows);
        assert!(matches!(result, Err(CatalogError::EmptyCatalog)));
    }

    #[test]
    fn test_from_catalog_ignores_duplicate_rows() {
        let rows = vec![row(100.0, 2000.0), row(150.0, 2000.0)];
        let mut dup = row(100.0, 2000.0);
        dup.bpm = 300.0;
        let catalog = Catalog::from_rows(rows.iter().chain(std::iter::once(&dup)));
        let ranges = PropertyRangeIndex::from_catalog(&catalog).unwrap();
        assert_eq!(ranges.range(NumericAttribute::Bpm), 50.0);
    }

    #[test]
    fn test_every_attribute_has_entry() {
        let rows = vec![row(1.0, 1.0), row(2.0, 2.0)];
        let ranges = PropertyRangeIndex::build(&rows).unwrap();
        assert_eq!(ranges.iter().count(), NUMERIC_ATTRIBUTE_COUNT);
        assert!(ranges.iter().all(|(_, r)| r >= 0.0));
    }
}
