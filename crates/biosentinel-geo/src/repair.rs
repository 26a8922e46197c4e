//! Ring repair of raw polygonal input.
//!
//! Repair is limited to the closing rule: a ring whose first and last
//! coordinates differ gets a copy of its first coordinate appended. Winding
//! order, self-intersections and degenerate rings are left to the remote
//! service.
//!
//! A Polygon keeps only its outer ring; interior rings are discarded. Every
//! ring of a MultiPolygon is kept and closed.
//!
//! Coordinates are two-dimensional. Altitude and any further ordinates are
//! dropped before the closing rule runs, so closure compares longitude and
//! latitude only, and an already-closed 3D ring comes back closed but without
//! its altitudes. Already-closed 2D rings are returned unchanged.

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{Geometry, Ring};

/// Close `ring` in place. No-op for empty or already-closed rings.
pub fn close_ring(ring: &mut Ring) {
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            let first = *first;
            ring.push(first);
        }
    }
}

/// Repair a raw GeoJSON geometry into the canonical closed-ring form
pub fn repair(raw: &geojson::Geometry) -> Result<Geometry> {
    repair_with_id(raw, "geometry")
}

/// Repair the geometry of feature `feature_id`, reporting the id on failure
pub fn repair_feature(feature_id: u64, raw: &geojson::Geometry) -> Result<Geometry> {
    repair_with_id(raw, &feature_id.to_string())
}

/// Repair a GeoJSON geometry given as an untyped JSON value
pub fn repair_value(raw: &serde_json::Value) -> Result<Geometry> {
    let geometry: geojson::Geometry =
        serde_json::from_value(raw.clone()).map_err(|e| BioSentinelError::InvalidGeometry {
            feature_id: "geometry".to_string(),
            reason: format!("not a GeoJSON geometry: {}", e),
        })?;
    repair(&geometry)
}

fn repair_with_id(raw: &geojson::Geometry, feature_id: &str) -> Result<Geometry> {
    match &raw.value {
        geojson::Value::Polygon(rings) => {
            let outer = rings.first().ok_or_else(|| BioSentinelError::InvalidGeometry {
                feature_id: feature_id.to_string(),
                reason: "polygon has no rings".to_string(),
            })?;
            Ok(Geometry::polygon(repair_polygon(std::slice::from_ref(outer), feature_id)?))
        }
        geojson::Value::MultiPolygon(polygons) => {
            let polygons = polygons
                .iter()
                .map(|rings| repair_polygon(rings, feature_id))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::multi_polygon(polygons))
        }
        other => Err(BioSentinelError::UnsupportedGeometry { kind: kind_name(other).to_string() }),
    }
}

fn kind_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn repair_polygon(rings: &[Vec<geojson::Position>], feature_id: &str) -> Result<Vec<Ring>> {
    rings
        .iter()
        .map(|positions| {
            let mut ring = positions
                .iter()
                .map(|position| to_coordinate(position, feature_id))
                .collect::<Result<Ring>>()?;
            close_ring(&mut ring);
            Ok(ring)
        })
        .collect()
}

fn to_coordinate(position: &[f64], feature_id: &str) -> Result<[f64; 2]> {
    match position {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok([*lon, *lat]),
        [lon, lat, ..] => Err(BioSentinelError::InvalidGeometry {
            feature_id: feature_id.to_string(),
            reason: format!("non-finite coordinate ({}, {})", lon, lat),
        }),
        _ => Err(BioSentinelError::InvalidGeometry {
            feature_id: feature_id.to_string(),
            reason: format!("position has {} ordinates, expected at least 2", position.len()),
        }),
    }
}
