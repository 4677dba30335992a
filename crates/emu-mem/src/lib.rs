//! Byte-addressable memory for emulated machines.
//!
//! [`PagedMemory`] is a fixed-size address space split into pages that are only allocated when
//! first written, so a large but mostly empty address space costs no more host memory than the
//! bytes actually touched. It offers big-endian 8/16/32/64-bit accessors and bulk copies whose
//! cost is proportional to the bytes moved.
//!
//! Processor models consume memory through the [`AddressSpace`] trait so they can be tested
//! against simpler backends.

#![forbid(unsafe_code)]

mod error;
mod paged;
mod space;

#[cfg(test)]
mod proptests;

pub use error::{MemoryError, Result};
pub use paged::{PagedMemory, PagedMemoryOptions};
pub use space::AddressSpace;
