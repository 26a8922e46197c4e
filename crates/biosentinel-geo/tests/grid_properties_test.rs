//! Property tests for lattice generation

use biosentinel_core::models::{BoundingBox, GridSpec, Point};
use biosentinel_geo::{bbox_from_point, generate_grid, grid_dimensions};
use proptest::prelude::*;

fn bbox_and_resolution() -> impl Strategy<Value = (BoundingBox, f64)> {
    (-170.0f64..170.0, -80.0f64..80.0, 0.01f64..5.0, 0.01f64..5.0, 0.05f64..1.0).prop_map(
        |(min_lon, min_lat, width, height, resolution)| {
            let bbox = BoundingBox::new(min_lon, min_lat, min_lon + width, min_lat + height).unwrap();
            (bbox, resolution)
        },
    )
}

proptest! {
    #[test]
    fn prop_point_count_matches_dimensions((bbox, resolution) in bbox_and_resolution()) {
        let points = generate_grid(&bbox, resolution).unwrap();
        let (n_lon, n_lat) = grid_dimensions(&GridSpec::new(bbox, resolution).unwrap());

        prop_assert_eq!(points.len(), n_lon * n_lat);

        // Each axis is covered by its steps and the last step starts inside the box
        prop_assert!(n_lon as f64 * resolution >= bbox.width() * (1.0 - 1e-6));
        prop_assert!((n_lon - 1) as f64 * resolution < bbox.width());
        prop_assert!(n_lat as f64 * resolution >= bbox.height() * (1.0 - 1e-6));
        prop_assert!((n_lat - 1) as f64 * resolution < bbox.height());
    }

    #[test]
    fn prop_points_inside_half_open_box((bbox, resolution) in bbox_and_resolution()) {
        for point in generate_grid(&bbox, resolution).unwrap() {
            prop_assert!(bbox.contains(&point), "{:?} outside {:?}", point, bbox);
        }
    }

    #[test]
    fn prop_longitude_major_order((bbox, resolution) in bbox_and_resolution()) {
        let points = generate_grid(&bbox, resolution).unwrap();
        let (_, n_lat) = grid_dimensions(&GridSpec::new(bbox, resolution).unwrap());

        for (idx, window) in points.windows(2).enumerate() {
            if (idx + 1) % n_lat == 0 {
                prop_assert!(window[1].lon > window[0].lon);
                prop_assert_eq!(window[1].lat, bbox.min_lat);
            } else {
                prop_assert_eq!(window[1].lon, window[0].lon);
                prop_assert!(window[1].lat > window[0].lat);
            }
        }
    }

    #[test]
    fn prop_generation_is_deterministic((bbox, resolution) in bbox_and_resolution()) {
        prop_assert_eq!(generate_grid(&bbox, resolution).unwrap(), generate_grid(&bbox, resolution).unwrap());
    }

    #[test]
    fn prop_bbox_from_point_is_symmetric(lon in -170.0f64..170.0, lat in -80.0f64..80.0, radius in 0.1f64..500.0) {
        let bbox = bbox_from_point(Point::new(lon, lat), radius).unwrap();

        prop_assert!(((bbox.min_lon + bbox.max_lon) / 2.0 - lon).abs() < 1e-9);
        prop_assert!(((bbox.min_lat + bbox.max_lat) / 2.0 - lat).abs() < 1e-9);
        prop_assert!((bbox.width() - bbox.height()).abs() < 1e-9);
    }
}
