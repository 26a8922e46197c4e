use crate::error::{BioSentinelError, Result};

/// Contiguous, size-bounded slice of an ordered collection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk<'a, T> {
    /// Position of the chunk in the partition
    pub index: usize,
    /// Offset of the first item in the source collection
    pub offset: usize,
    pub items: &'a [T],
}

impl<'a, T> Chunk<'a, T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split `items` into chunks of at most `chunk_size`.
///
/// The chunks cover `items` exactly and in order; only the final chunk may be
/// smaller. An empty input yields no chunks.
pub fn partition<T>(items: &[T], chunk_size: usize) -> Result<Vec<Chunk<'_, T>>> {
    if chunk_size == 0 {
        return Err(BioSentinelError::InvalidChunkSize { size: chunk_size });
    }

    Ok(items
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, slice)| Chunk { index, offset: index * chunk_size, items: slice })
        .collect())
}
