//! Chunk planning for file transfers
//!
//! Computes the ordered sequence of byte windows a file is split into before
//! publishing. Windows are contiguous and non-overlapping; their lengths sum
//! to the file size, so the plan partitions `[0, file_size)` exactly.

use super::error::TransferError;

/// A single contiguous byte range of the file, the unit of one publish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    pub index: u64,
    pub offset: u64,
    pub len: u64,
}

/// Slicing of a file of `file_size` bytes into `chunk_size`-byte windows
///
/// The last window is shorter when `chunk_size` does not divide `file_size`.
/// A zero-byte file produces an empty plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }
        Ok(Self {
            file_size,
            chunk_size,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn total_chunks(&self) -> u64 {
        self.file_size.div_ceil(self.chunk_size)
    }

    /// Window for an explicitly requested chunk index
    ///
    /// Fails with `InvalidChunkRange` when the window would start at or past
    /// the end of the file.
    pub fn window(&self, index: u64) -> Result<ChunkWindow, TransferError> {
        let offset = index
            .checked_mul(self.chunk_size)
            .ok_or(TransferError::InvalidChunkRange {
                index,
                file_size: self.file_size,
            })?;
        if offset >= self.file_size {
            return Err(TransferError::InvalidChunkRange {
                index,
                file_size: self.file_size,
            });
        }
        Ok(ChunkWindow {
            index,
            offset,
            len: self.chunk_size.min(self.file_size - offset),
        })
    }

    /// Iterator over all windows of the file, in order
    pub fn windows(&self) -> impl Iterator<Item = ChunkWindow> + '_ {
        (0..self.total_chunks()).map(|index| {
            let offset = index * self.chunk_size;
            ChunkWindow {
                index,
                offset,
                len: self.chunk_size.min(self.file_size - offset),
            }
        })
    }
}
