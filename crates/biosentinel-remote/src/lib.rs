//! BioSentinel Remote - HTTP adapters for the remote collaborators
//!
//! The imagery session and the regression model client implement the core
//! ports over HTTP. Both are synchronous at the port boundary and drive
//! their requests on a private single-threaded runtime.

pub mod imagery;
pub mod model;
mod session;

pub use imagery::ImagerySession;
pub use model::HttpRegressionModel;
pub use session::RemoteSession;
