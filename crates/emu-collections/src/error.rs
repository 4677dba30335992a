use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectionError>;

/// Errors returned by [`PagedList`](crate::PagedList) and
/// [`PagedCollection`](crate::PagedCollection).
///
/// All of them are raised before the container is modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("index out of range: index={index} len={len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid page size {page_size}")]
    InvalidPageSize { page_size: usize },

    /// The destination slice cannot hold `len` elements starting at `offset`.
    #[error("destination too small: offset={offset} len={len} available={available}")]
    DestinationTooSmall {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// A [`Cursor`](crate::Cursor) was advanced after its list was modified.
    #[error("list was modified during iteration")]
    ConcurrentModification,

    #[error("end_bulk called without a matching begin_bulk")]
    UnbalancedBulkOperation,
}
