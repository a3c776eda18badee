//! Splitting the target list into fixed-size blocks.

use crate::error::BlockError;
use crate::manifest::FetchTarget;

/// An ordered group of targets fetched concurrently as one wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Zero-based position of this block in the run.
    pub index: usize,
    pub targets: Vec<FetchTarget>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Split `targets` into consecutive blocks of at most `block_size`.
///
/// Every target lands in exactly one block and input order is kept; only
/// the last block may be short. An empty list yields no blocks.
pub fn partition(targets: Vec<FetchTarget>, block_size: usize) -> Result<Vec<Block>, BlockError> {
    if block_size == 0 {
        return Err(BlockError::InvalidBlockSize(block_size));
    }

    let block_count = targets.len().div_ceil(block_size);
    let mut remaining = targets.into_iter();

    Ok((0..block_count)
        .map(|index| Block {
            index,
            targets: remaining.by_ref().take(block_size).collect(),
        })
        .collect())
}
