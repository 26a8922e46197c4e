//! Port trait definitions
//!
//! These traits define the interfaces that collaborator adapters must implement.
//! Every remote interaction goes through an explicit implementation handed to
//! a constructor; nothing relies on an ambient session.

pub mod imagery;
pub mod model;
pub mod storage;

pub use imagery::ImageryService;
pub use model::RegressionModel;
pub use storage::ArtifactStore;
