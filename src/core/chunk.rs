//! Fixed-size batching of arbitrary sequences.
//!
//! ```
//! use lookahead_pool::chunk;
//!
//! let groups: Vec<Vec<u32>> = chunk(0..25, 10)?.collect();
//! assert_eq!(groups[0], (0..10).collect::<Vec<_>>());
//! assert_eq!(groups[1], (10..20).collect::<Vec<_>>());
//! assert_eq!(groups[2], vec![20, 21, 22, 23, 24]);
//! # Ok::<(), lookahead_pool::ConfigError>(())
//! ```

use std::iter::FusedIterator;

use super::ConfigError;

/// Split `iterable` into groups of `size` elements.
///
/// Every group holds exactly `size` elements except the last, which holds
/// the remainder. Empty input yields no groups.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidChunkSize`] if `size` is zero.
pub fn chunk<I>(iterable: I, size: usize) -> Result<Chunks<I::IntoIter>, ConfigError>
where
    I: IntoIterator,
{
    if size == 0 {
        return Err(ConfigError::InvalidChunkSize);
    }
    Ok(Chunks {
        iter: iterable.into_iter(),
        size,
    })
}

/// Lazy iterator over fixed-size groups, created by [`chunk`].
#[derive(Debug, Clone)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Chunks<I> {
    iter: I,
    size: usize,
}

impl<I> Chunks<I> {
    /// Configured group size.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let group: Vec<_> = self.iter.by_ref().take(self.size).collect();
        if group.is_empty() {
            None
        } else {
            Some(group)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.iter.size_hint();
        (
            lower.div_ceil(self.size),
            upper.map(|upper| upper.div_ceil(self.size)),
        )
    }
}

impl<I: ExactSizeIterator> ExactSizeIterator for Chunks<I> {}

impl<I: FusedIterator> FusedIterator for Chunks<I> {}

/// Adds [`chunked`](ChunkExt::chunked) to every iterator.
pub trait ChunkExt: Iterator + Sized {
    /// Group this iterator's items, see [`chunk`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChunkSize`] if `size` is zero.
    fn chunked(self, size: usize) -> Result<Chunks<Self>, ConfigError> {
        chunk(self, size)
    }
}

impl<I: Iterator> ChunkExt for I {}
