use crate::error::Result;
use crate::models::{
    ExportDescriptor, FeatureCollectionRequest, LayerRef, ReduceSpec, TableHandle, TaskId,
};

/// Port for the remote imagery and feature-query service
pub trait ImageryService {
    /// Fetch one band over `layer.region` at `layer.spec.scale` as GeoTIFF bytes
    fn fetch_raster(&self, layer: &LayerRef) -> Result<Vec<u8>>;

    /// Number of features left after the request's spatial filter is applied remotely
    fn count_features(&self, collection: &FeatureCollectionRequest) -> Result<usize>;

    /// Reduce the image stack over every feature of the collection
    fn reduce_over_features(
        &self,
        collection: &FeatureCollectionRequest,
        spec: &ReduceSpec,
    ) -> Result<TableHandle>;

    /// Start an export of `table`. Returns as soon as the remote task is accepted.
    fn export_table_async(&self, table: &TableHandle, destination: &ExportDescriptor)
        -> Result<TaskId>;
}

impl<T: ImageryService + ?Sized> ImageryService for &T {
    fn fetch_raster(&self, layer: &LayerRef) -> Result<Vec<u8>> {
        (**self).fetch_raster(layer)
    }

    fn count_features(&self, collection: &FeatureCollectionRequest) -> Result<usize> {
        (**self).count_features(collection)
    }

    fn reduce_over_features(
        &self,
        collection: &FeatureCollectionRequest,
        spec: &ReduceSpec,
    ) -> Result<TableHandle> {
        (**self).reduce_over_features(collection, spec)
    }

    fn export_table_async(
        &self,
        table: &TableHandle,
        destination: &ExportDescriptor,
    ) -> Result<TaskId> {
        (**self).export_table_async(table, destination)
    }
}
