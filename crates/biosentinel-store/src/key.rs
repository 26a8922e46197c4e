//! Storage keys derived from a fingerprint of every request parameter.

use sha2::{Digest, Sha256};

use biosentinel_core::models::{BoundingBox, DateRange, LayerRef, LayerSpec, StorageKey};

/// SHA-256 hex digest over dataset, band, scale, region bounds and date range.
///
/// Floats are hashed by bit pattern, so bounds that differ in the last ulp
/// get distinct fingerprints.
pub fn fingerprint(region: &BoundingBox, spec: &LayerSpec, date_range: &DateRange) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"dataset=");
    hasher.update(spec.dataset.as_bytes());
    hasher.update(b"\nband=");
    hasher.update(spec.band.as_bytes());
    hasher.update(b"\nscale=");
    hasher.update(spec.scale.to_bits().to_be_bytes());
    hasher.update(b"\nregion=");
    for bound in region.to_array() {
        hasher.update(bound.to_bits().to_be_bytes());
    }
    hasher.update(b"\ndates=");
    hasher.update(date_range.start.to_string().as_bytes());
    hasher.update(b"..");
    hasher.update(date_range.end.to_string().as_bytes());

    format!("{:x}", hasher.finalize())
}

/// `{band}_{fingerprint}.tif`, with the band reduced to filename-safe characters
pub fn storage_key(region: &BoundingBox, spec: &LayerSpec, date_range: &DateRange) -> StorageKey {
    let band: String = spec
        .band
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    StorageKey(format!("{}_{}.tif", band, fingerprint(region, spec, date_range)))
}

/// Fully resolved layer request with its derived key
pub fn layer_ref(region: &BoundingBox, spec: &LayerSpec, date_range: &DateRange) -> LayerRef {
    LayerRef {
        region: *region,
        spec: spec.clone(),
        date_range: *date_range,
        key: storage_key(region, spec, date_range),
    }
}
