//! Region construction and regular point lattices.

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{BoundingBox, GridSpec, Point, RegionSpec};

/// Flat-earth conversion factor. No latitude correction is applied.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Relative slack on `span / resolution` so a span that is an exact multiple
/// of the resolution in decimal does not gain a point from float rounding.
const STEP_TOLERANCE: f64 = 1e-9;

/// Square bounding box of half-side `radius_km` centered on `center`
pub fn bbox_from_point(center: Point, radius_km: f64) -> Result<BoundingBox> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(BioSentinelError::InvalidGridSpec {
            reason: format!("radius must be a positive number of kilometers, got {}", radius_km),
        });
    }

    let offset = radius_km / KM_PER_DEGREE;
    BoundingBox::new(
        center.lon - offset,
        center.lat - offset,
        center.lon + offset,
        center.lat + offset,
    )
}

/// Resolve a configured region to explicit bounds
pub fn resolve_region(region: &RegionSpec) -> Result<BoundingBox> {
    match region {
        RegionSpec::Bounds(bbox) => {
            bbox.validate()?;
            Ok(*bbox)
        }
        RegionSpec::Around { lon, lat, radius_km } => {
            bbox_from_point(Point::new(*lon, *lat), *radius_km)
        }
    }
}

/// Number of lattice steps along an axis of length `span`
fn axis_steps(span: f64, resolution: f64) -> usize {
    let steps = span / resolution;
    (steps - steps * STEP_TOLERANCE).ceil().max(1.0) as usize
}

/// Lattice size as `(longitude steps, latitude steps)`
pub fn grid_dimensions(spec: &GridSpec) -> (usize, usize) {
    (
        axis_steps(spec.bbox.width(), spec.resolution),
        axis_steps(spec.bbox.height(), spec.resolution),
    )
}

/// Regular lattice over `bbox`, longitude-major then latitude.
///
/// Stepping is start-inclusive and half-open, so no point is emitted on the
/// upper bound of either axis.
pub fn generate_grid(bbox: &BoundingBox, resolution: f64) -> Result<Vec<Point>> {
    let spec = GridSpec::new(*bbox, resolution)?;
    let (n_lon, n_lat) = grid_dimensions(&spec);

    let total = n_lon.checked_mul(n_lat).ok_or_else(|| BioSentinelError::InvalidGridSpec {
        reason: format!("{} x {} lattice is too large", n_lon, n_lat),
    })?;

    let mut points = Vec::with_capacity(total);
    for i in 0..n_lon {
        let lon = bbox.min_lon + i as f64 * resolution;
        for j in 0..n_lat {
            let lat = bbox.min_lat + j as f64 * resolution;
            points.push(Point::new(lon, lat));
        }
    }

    tracing::debug!(n_lon, n_lat, resolution, "Generated sampling grid");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(point: &Point, lon: f64, lat: f64) {
        assert!((point.lon - lon).abs() < 1e-9, "lon {} != {}", point.lon, lon);
        assert!((point.lat - lat).abs() < 1e-9, "lat {} != {}", point.lat, lat);
    }

    #[test]
    fn test_chiribiquete_window() {
        let bbox = BoundingBox::new(-76.6, 2.6, -76.4, 2.8).unwrap();
        let points = generate_grid(&bbox, 0.1).unwrap();

        assert_eq!(points.len(), 4);
        assert_point(&points[0], -76.6, 2.6);
        assert_point(&points[1], -76.6, 2.7);
        assert_point(&points[2], -76.5, 2.6);
        assert_point(&points[3], -76.5, 2.7);
    }

    #[test]
    fn test_partial_step_adds_point() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.25, 0.1).unwrap();
        let points = generate_grid(&bbox, 0.1).unwrap();

        // 0.0, 0.1, 0.2 along longitude, a single latitude row
        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.lon < 0.25 && p.lat == 0.0));
    }

    #[test]
    fn test_resolution_coarser_than_bbox() {
        let bbox = BoundingBox::new(10.0, 10.0, 10.5, 10.5).unwrap();
        let points = generate_grid(&bbox, 2.0).unwrap();
        assert_eq!(points, vec![Point::new(10.0, 10.0)]);
    }

    #[test]
    fn test_non_positive_resolution_rejected() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();

        for resolution in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let err = generate_grid(&bbox, resolution).unwrap_err();
            assert!(matches!(err, BioSentinelError::InvalidGridSpec { .. }));
        }
    }

    #[test]
    fn test_degenerate_bbox_rejected() {
        let bbox = BoundingBox { min_lon: 1.0, max_lon: 1.0, min_lat: 0.0, max_lat: 1.0 };
        assert!(matches!(
            generate_grid(&bbox, 0.1),
            Err(BioSentinelError::InvalidGridSpec { .. })
        ));
    }

    #[test]
    fn test_bbox_from_point_flat_approximation() {
        let bbox = bbox_from_point(Point::new(-73.0347, 0.8496), 111.0).unwrap();

        assert!((bbox.min_lon - -74.0347).abs() < 1e-12);
        assert!((bbox.max_lon - -72.0347).abs() < 1e-12);
        assert!((bbox.min_lat - -0.1504).abs() < 1e-12);
        assert!((bbox.max_lat - 1.8496).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_from_point_ignores_latitude() {
        let equator = bbox_from_point(Point::new(0.0, 0.0), 55.5).unwrap();
        let north = bbox_from_point(Point::new(0.0, 60.0), 55.5).unwrap();
        assert!((equator.width() - north.width()).abs() < 1e-12);
    }

    #[test]
    fn test_bbox_from_point_rejects_bad_radius() {
        assert!(bbox_from_point(Point::new(0.0, 0.0), 0.0).is_err());
        assert!(bbox_from_point(Point::new(0.0, 0.0), -5.0).is_err());
    }

    #[test]
    fn test_resolve_region() {
        let bounds = BoundingBox::new(-1.0, -1.0, 1.0, 1.0).unwrap();
        assert_eq!(resolve_region(&RegionSpec::Bounds(bounds)).unwrap(), bounds);

        let around = resolve_region(&RegionSpec::Around { lon: 0.0, lat: 0.0, radius_km: 222.0 })
            .unwrap();
        assert!((around.width() - 4.0).abs() < 1e-12);
    }
}
