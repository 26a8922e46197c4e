//! BioSentinel Core - Domain models, ports, and configuration
//!
//! This crate contains the data model shared by the sampling and batching
//! pipelines, the collaborator port definitions, and layered configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod processing;

pub use error::{BioSentinelError, Result};
