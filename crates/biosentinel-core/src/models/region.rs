//! Regions of interest: points, bounding boxes, grid specifications and date ranges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BioSentinelError, Result};
use crate::models::geometry::Geometry;

/// Geographic point in degrees (EPSG:4326)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box in geographic degrees.
///
/// Construction through [`BoundingBox::new`] guarantees finite bounds with
/// `min < max` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a bounding box from its corners (`min_lon, min_lat, max_lon, max_lat`)
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let bbox = Self { min_lon, max_lon, min_lat, max_lat };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check the `min < max` invariant, e.g. after deserialization
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.min_lon, self.max_lon, self.min_lat, self.max_lat];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(BioSentinelError::InvalidGridSpec {
                reason: format!("bounding box has non-finite bounds: {:?}", bounds),
            });
        }
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(BioSentinelError::InvalidGridSpec {
                reason: format!(
                    "degenerate bounding box: lon [{}, {}], lat [{}, {}]",
                    self.min_lon, self.max_lon, self.min_lat, self.max_lat
                ),
            });
        }
        Ok(())
    }

    /// Parse `"min_lon,min_lat,max_lon,max_lat"`
    pub fn parse(s: &str) -> Result<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| BioSentinelError::ConfigInvalid {
                key: "bbox".to_string(),
                reason: format!("Invalid bounding box '{}': {}", s, e),
            })?;

        match values.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => {
                Self::new(*min_lon, *min_lat, *max_lon, *max_lat)
            }
            _ => Err(BioSentinelError::ConfigInvalid {
                key: "bbox".to_string(),
                reason: format!(
                    "Expected 4 comma-separated values (min_lon,min_lat,max_lon,max_lat), found {}",
                    values.len()
                ),
            }),
        }
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Half-open containment: `[min_lon, max_lon) x [min_lat, max_lat)`
    pub fn contains(&self, point: &Point) -> bool {
        point.lon >= self.min_lon
            && point.lon < self.max_lon
            && point.lat >= self.min_lat
            && point.lat < self.max_lat
    }

    /// Bounds as `[min_lon, min_lat, max_lon, max_lat]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// Closed rectangular polygon covering the box
    pub fn to_geometry(&self) -> Geometry {
        Geometry::polygon(vec![vec![
            [self.min_lon, self.min_lat],
            [self.max_lon, self.min_lat],
            [self.max_lon, self.max_lat],
            [self.min_lon, self.max_lat],
            [self.min_lon, self.min_lat],
        ]])
    }
}

/// How a region of interest is defined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSpec {
    /// Explicit bounds
    Bounds(BoundingBox),
    /// Square around a center point with half-side `radius_km`
    Around { lon: f64, lat: f64, radius_km: f64 },
}

/// Regular sampling lattice over a bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub bbox: BoundingBox,
    /// Spacing in degrees, strictly positive
    pub resolution: f64,
}

impl GridSpec {
    pub fn new(bbox: BoundingBox, resolution: f64) -> Result<Self> {
        bbox.validate()?;
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(BioSentinelError::InvalidGridSpec {
                reason: format!("resolution must be a positive number of degrees, got {}", resolution),
            });
        }
        Ok(Self { bbox, resolution })
    }
}

/// Inclusive date window passed opaquely to the imagery service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start >= end {
            return Err(BioSentinelError::ConfigInvalid {
                key: "date_range".to_string(),
                reason: format!("start date {} must precede end date {}", start, end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two ISO-8601 dates (`YYYY-MM-DD`)
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |key: &str, value: &str| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
                BioSentinelError::ConfigInvalid {
                    key: key.to_string(),
                    reason: format!("Invalid date '{}': {}", value, e),
                }
            })
        };
        Self::new(parse("start_date", start)?, parse("end_date", end)?)
    }
}
