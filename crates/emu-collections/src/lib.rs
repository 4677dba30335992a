//! Paged containers used by the emulator's tooling.
//!
//! [`PagedList`] is a growable list that stores its elements in fixed-size pages instead of one
//! contiguous buffer, so growing never moves existing elements and inserting or removing in the
//! middle only touches the pages after the affected position. [`PagedCollection`] wraps it with
//! [`CollectionHooks`] so a presentation layer can observe every change without the list knowing
//! about it.
//!
//! Neither type is synchronized; callers serialize access.

#![forbid(unsafe_code)]

mod collection;
mod error;
mod iter;
mod list;

#[cfg(test)]
mod proptests;

pub use collection::{CollectionHooks, PagedCollection};
pub use error::{CollectionError, Result};
pub use iter::{Cursor, IntoIter, Iter};
pub use list::PagedList;
