pub mod chunk;

pub use chunk::{partition, Chunk};
