//! Canonical area geometry used for remote feature construction.
//!
//! Only polygonal kinds are representable: anything else is rejected when raw
//! input is repaired. The enum serializes as a GeoJSON geometry object.

use serde::{Deserialize, Serialize};

/// Ordered boundary coordinates of a polygon as `[lon, lat]` pairs
pub type Ring = Vec<[f64; 2]>;

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Polygon,
    MultiPolygon,
}

/// GeoJSON-compatible polygonal geometry.
///
/// After repair every ring is closed (first coordinate == last coordinate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
}

impl Geometry {
    /// Create a Polygon geometry (outer ring first, then holes)
    pub fn polygon(rings: Vec<Ring>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Create a MultiPolygon geometry
    pub fn multi_polygon(polygons: Vec<Vec<Ring>>) -> Self {
        Geometry::MultiPolygon { coordinates: polygons }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
        }
    }

    /// Iterate over every ring of the geometry in order
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Geometry::Polygon { coordinates } => Box::new(coordinates.iter()),
            Geometry::MultiPolygon { coordinates } => Box::new(coordinates.iter().flatten()),
        }
    }

    /// Whether every ring is closed
    pub fn is_closed(&self) -> bool {
        self.rings().all(|ring| ring.first() == ring.last())
    }

    /// Convert to serde_json::Value (GeoJSON)
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_serialization() {
        let polygon = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
        let json = serde_json::to_string(&polygon).unwrap();
        assert!(json.contains("\"type\":\"Polygon\""));

        let parsed: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(polygon, parsed);
    }

    #[test]
    fn test_rings_iterates_all_polygons() {
        let multi = Geometry::multi_polygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]],
            vec![vec![[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]],
        ]);
        assert_eq!(multi.rings().count(), 2);
        assert!(!multi.is_closed());
        assert_eq!(multi.geometry_type(), GeometryType::MultiPolygon);
    }
}
