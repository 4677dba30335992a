use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors returned by [`PagedMemory`](crate::PagedMemory) and other
/// [`AddressSpace`](crate::AddressSpace) backends.
///
/// Every variant except [`MemoryError::Io`] is raised by argument validation, which always runs
/// before any byte of memory (or of the caller's buffer) is touched.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The access `[address, address + len)` does not fit inside `[0, size)`.
    #[error("memory access out of range: address=0x{address:x} len={len} size=0x{size:x}")]
    OutOfRange { address: u64, len: usize, size: u64 },

    /// The caller-supplied buffer window `[index, index + len)` does not fit inside the buffer.
    #[error("buffer range out of bounds: index={index} len={len} buffer_len={buffer_len}")]
    BufferOutOfRange {
        index: usize,
        len: usize,
        buffer_len: usize,
    },

    #[error("invalid memory page size {page_size}")]
    InvalidPageSize { page_size: usize },

    /// The requested size cannot be represented by the current platform's `usize`.
    #[error("memory size {size} does not fit in usize")]
    SizeTooLarge { size: u64 },

    #[error("failed to read memory image: {0}")]
    Io(#[from] std::io::Error),
}
