//! Single-band GeoTIFF reading and writing.
//!
//! Georeferencing is taken from the ModelPixelScale and ModelTiepoint tags;
//! rotated rasters (ModelTransformation) are not supported. The no-data value
//! comes from the GDAL_NODATA ASCII tag when present.

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

use biosentinel_core::error::{BioSentinelError, Result};
use biosentinel_core::models::{BoundingBox, Point, SampleValue, StorageKey};

/// GeoKeyDirectory declaring a geographic WGS84 raster with area pixels
const WGS84_GEOKEYS: [u16; 16] = [
    1, 1, 0, 3, // header: version 1.1.0, 3 keys
    1024, 0, 1, 2, // GTModelTypeGeoKey = Geographic
    1025, 0, 1, 1, // GTRasterTypeGeoKey = PixelIsArea
    2048, 0, 1, 4326, // GeographicTypeGeoKey = EPSG:4326
];

/// Decoded north-up raster, band 0 only, row-major from the top-left pixel
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    /// Longitude of the left edge
    origin_lon: f64,
    /// Latitude of the top edge
    origin_lat: f64,
    /// Pixel size in degrees as (x, y), both positive
    pixel_size: (f64, f64),
    nodata: Option<f64>,
    pixels: Vec<f64>,
}

impl Raster {
    /// Raster covering `bbox` with `pixels` in row-major order
    pub fn from_bounds(
        bbox: &BoundingBox,
        width: u32,
        height: u32,
        pixels: Vec<f64>,
        nodata: Option<f64>,
    ) -> Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(BioSentinelError::RasterDecode {
                key: "in-memory".to_string(),
                reason: format!(
                    "{} pixels do not fill a {}x{} raster",
                    pixels.len(),
                    width,
                    height
                ),
            });
        }

        Ok(Self {
            width,
            height,
            origin_lon: bbox.min_lon,
            origin_lat: bbox.max_lat,
            pixel_size: (bbox.width() / width as f64, bbox.height() / height as f64),
            nodata,
            pixels,
        })
    }

    /// Decode GeoTIFF bytes read from `key`
    pub fn decode(bytes: &[u8], key: &StorageKey) -> Result<Self> {
        let fail = |reason: String| BioSentinelError::RasterDecode { key: key.to_string(), reason };

        let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| fail(e.to_string()))?;
        let (width, height) = decoder.dimensions().map_err(|e| fail(e.to_string()))?;

        let scale = decoder
            .find_tag(Tag::ModelPixelScaleTag)
            .map_err(|e| fail(e.to_string()))?
            .ok_or_else(|| fail("missing ModelPixelScale tag".to_string()))?
            .into_f64_vec()
            .map_err(|e| fail(e.to_string()))?;
        let tiepoint = decoder
            .find_tag(Tag::ModelTiepointTag)
            .map_err(|e| fail(e.to_string()))?
            .ok_or_else(|| fail("missing ModelTiepoint tag".to_string()))?
            .into_f64_vec()
            .map_err(|e| fail(e.to_string()))?;

        let (sx, sy) = match scale.as_slice() {
            [sx, sy, ..] if *sx > 0.0 && *sy > 0.0 => (*sx, *sy),
            other => return Err(fail(format!("unsupported pixel scale {:?}", other))),
        };
        let (origin_lon, origin_lat) = match tiepoint.as_slice() {
            [i, j, _, x, y, ..] => (x - i * sx, y + j * sy),
            other => return Err(fail(format!("malformed tiepoint {:?}", other))),
        };

        let nodata = match decoder.find_tag(Tag::GdalNodata).map_err(|e| fail(e.to_string()))? {
            Some(value) => {
                let text = value.into_string().map_err(|e| fail(e.to_string()))?;
                let text = text.trim_matches(char::from(0)).trim();
                Some(
                    text.parse::<f64>()
                        .map_err(|_| fail(format!("unparseable GDAL_NODATA '{}'", text)))?,
                )
            }
            None => None,
        };

        let samples: Vec<f64> = match decoder.read_image().map_err(|e| fail(e.to_string()))? {
            DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
            DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
            DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::F64(v) => v,
            #[allow(unreachable_patterns)]
            _ => return Err(fail("unsupported sample format".to_string())),
        };

        let pixel_count = width as usize * height as usize;
        if pixel_count == 0 || samples.len() % pixel_count != 0 {
            return Err(fail(format!(
                "{} samples for a {}x{} image",
                samples.len(),
                width,
                height
            )));
        }

        // Interleaved bands: keep the first sample of every pixel
        let samples_per_pixel = samples.len() / pixel_count;
        let pixels = if samples_per_pixel == 1 {
            samples
        } else {
            samples.into_iter().step_by(samples_per_pixel).collect()
        };

        tracing::debug!(key = %key, width, height, samples_per_pixel, ?nodata, "Decoded raster");

        Ok(Self { width, height, origin_lon, origin_lat, pixel_size: (sx, sy), nodata, pixels })
    }

    /// Encode as a 64-bit float GeoTIFF in EPSG:4326
    pub fn to_geotiff_bytes(&self) -> Result<Vec<u8>> {
        let encode_err = |e: tiff::TiffError| BioSentinelError::Serialization(format!("GeoTIFF encoding failed: {}", e));

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).map_err(encode_err)?;
            let mut image =
                encoder.new_image::<Gray64Float>(self.width, self.height).map_err(encode_err)?;

            let pixel_scale = [self.pixel_size.0, self.pixel_size.1, 0.0];
            image.encoder().write_tag(Tag::ModelPixelScaleTag, pixel_scale.as_slice()).map_err(encode_err)?;

            let tiepoint = [0.0, 0.0, 0.0, self.origin_lon, self.origin_lat, 0.0];
            image.encoder().write_tag(Tag::ModelTiepointTag, tiepoint.as_slice()).map_err(encode_err)?;

            image
                .encoder()
                .write_tag(Tag::GeoKeyDirectoryTag, WGS84_GEOKEYS.as_slice())
                .map_err(encode_err)?;

            if let Some(nodata) = self.nodata {
                let text = nodata.to_string();
                image.encoder().write_tag(Tag::GdalNodata, text.as_str()).map_err(encode_err)?;
            }

            image.write_data(&self.pixels).map_err(encode_err)?;
        }
        Ok(buffer.into_inner())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Spatial extent of the raster
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            min_lon: self.origin_lon,
            max_lon: self.origin_lon + self.width as f64 * self.pixel_size.0,
            min_lat: self.origin_lat - self.height as f64 * self.pixel_size.1,
            max_lat: self.origin_lat,
        }
    }

    /// Pixel (column, row) containing `point`, `None` outside the closed extent.
    ///
    /// Points on the right or bottom edge belong to the last column or row.
    pub fn pixel_at(&self, point: &Point) -> Option<(u32, u32)> {
        let col = edge_index((point.lon - self.origin_lon) / self.pixel_size.0, self.width)?;
        let row = edge_index((self.origin_lat - point.lat) / self.pixel_size.1, self.height)?;
        Some((col, row))
    }

    /// Value at `point`. Outside the extent, the no-data value and NaN all yield `NoData`.
    pub fn value_at(&self, point: &Point) -> SampleValue {
        let Some((col, row)) = self.pixel_at(point) else {
            return SampleValue::NoData;
        };

        let value = self.pixels[row as usize * self.width as usize + col as usize];
        match self.nodata {
            Some(nodata) if value == nodata => SampleValue::NoData,
            _ => SampleValue::from(Some(value)),
        }
    }
}

/// Tolerance, in pixels, for points that sit on the raster edge
const EDGE_TOLERANCE: f64 = 1e-6;

/// Pixel index along one axis from a fractional offset; `[0, len]` is inside
fn edge_index(offset: f64, len: u32) -> Option<u32> {
    if !offset.is_finite() || offset < -EDGE_TOLERANCE || offset > len as f64 + EDGE_TOLERANCE {
        return None;
    }
    Some((offset.max(0.0).floor() as u32).min(len.saturating_sub(1)))
}
