//! Conversions between the canonical geometry and the `geo` crate.

use geo::algorithm::centroid::Centroid;
use geo::Geometry as GeoGeometry;

use biosentinel_core::models::{Geometry, Point, Ring};

fn to_line_string(ring: &Ring) -> geo::LineString {
    let coords: Vec<geo::Coord> = ring.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect();
    geo::LineString::new(coords)
}

fn to_polygon(rings: &[Ring]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            to_line_string(exterior),
            interiors.iter().map(to_line_string).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(to_polygon(coordinates)),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(geo::MultiPolygon::new(
            coordinates.iter().map(|rings| to_polygon(rings)).collect(),
        )),
    }
}

/// Convert a lattice point to a geo::Point
pub fn to_geo_point(point: &Point) -> geo::Point {
    geo::Point::new(point.lon, point.lat)
}

/// Area-weighted centroid, `None` for empty geometries
pub fn centroid(geom: &Geometry) -> Option<Point> {
    to_geo_geometry(geom).centroid().map(|p| Point::new(p.x(), p.y()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_with_hole_conversion() {
        let geom = Geometry::polygon(vec![
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
        ]);

        match to_geo_geometry(&geom) {
            GeoGeometry::Polygon(polygon) => {
                assert_eq!(polygon.exterior().0.len(), 5);
                assert_eq!(polygon.interiors().len(), 1);
            }
            other => panic!("Expected Polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_centroid() {
        let geom = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 2.0],
            [0.0, 2.0],
            [0.0, 0.0],
        ]]);
        let centroid = centroid(&geom).unwrap();
        assert!((centroid.lon - 1.0).abs() < 1e-10);
        assert!((centroid.lat - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_multipolygon_centroid_is_area_weighted() {
        let geom = Geometry::multi_polygon(vec![
            vec![vec![[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]],
            vec![vec![[10.0, 0.0], [12.0, 0.0], [12.0, 2.0], [10.0, 2.0], [10.0, 0.0]]],
        ]);
        let centroid = centroid(&geom).unwrap();
        assert!((centroid.lon - 6.0).abs() < 1e-10);
        assert!((centroid.lat - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_polygon_has_no_centroid() {
        assert!(centroid(&Geometry::polygon(vec![])).is_none());
    }
}
