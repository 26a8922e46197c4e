//! Local spatial predicates.
//!
//! The remote service remains authoritative for filtering; these are used to
//! preview chunk contents without a remote round trip.

use geo::algorithm::intersects::Intersects;

use crate::models::to_geo_geometry;
use biosentinel_core::models::{FeatureRecord, Geometry};

/// Check if two geometries intersect
pub fn intersects(geometry: &Geometry, other: &Geometry) -> bool {
    to_geo_geometry(geometry).intersects(&to_geo_geometry(other))
}

/// Indices of the records intersecting `region`. Every record matches when no region is given.
pub fn filter_bounds(records: &[FeatureRecord], region: Option<&Geometry>) -> Vec<usize> {
    let region = match region {
        Some(region) => to_geo_geometry(region),
        None => return (0..records.len()).collect(),
    };

    records
        .iter()
        .enumerate()
        .filter(|(_, record)| to_geo_geometry(&record.geometry).intersects(&region))
        .map(|(idx, _)| idx)
        .collect()
}

/// Count records intersecting `region`
pub fn count_matches(records: &[FeatureRecord], region: Option<&Geometry>) -> usize {
    filter_bounds(records, region).len()
}
