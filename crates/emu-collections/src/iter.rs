use core::iter::FusedIterator;

use crate::{CollectionError, PagedList, Result};

/// Borrowing iterator over a [`PagedList`], in index order.
///
/// Holding it borrows the list, so the list cannot change while it is alive.
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    pages: core::slice::Iter<'a, Option<Vec<T>>>,
    current: core::slice::Iter<'a, T>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(pages: &'a [Option<Vec<T>>], len: usize) -> Self {
        Self {
            pages: pages.iter(),
            current: (&[]).iter(),
            remaining: len,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(element) = self.current.next() {
                self.remaining -= 1;
                return Some(element);
            }
            self.current = self.pages.next()?.as_deref().unwrap_or(&[]).iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Owning iterator over a [`PagedList`], in index order.
#[derive(Debug)]
pub struct IntoIter<T> {
    pages: std::vec::IntoIter<Option<Vec<T>>>,
    current: std::vec::IntoIter<T>,
    remaining: usize,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(pages: Vec<Option<Vec<T>>>, len: usize) -> Self {
        Self {
            pages: pages.into_iter(),
            current: Vec::new().into_iter(),
            remaining: len,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(element) = self.current.next() {
                self.remaining -= 1;
                return Some(element);
            }
            self.current = self.pages.next()?.unwrap_or_default().into_iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

/// A single-pass position in a [`PagedList`] that does not borrow the list between steps.
///
/// The cursor remembers the list version it was created from. Every step re-checks it, so
/// advancing after any modification of the list (including through `IndexMut`) fails with
/// [`CollectionError::ConcurrentModification`] instead of yielding shifted elements.
///
/// A cursor must only be used with the list that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    version: u64,
    position: usize,
}

impl Cursor {
    pub(crate) fn new(version: u64) -> Self {
        Self {
            version,
            position: 0,
        }
    }

    /// Index of the element the next successful [`Cursor::advance`] will yield.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Yields the next element, or `Ok(None)` once the end is reached.
    pub fn advance<'a, T>(&mut self, list: &'a PagedList<T>) -> Result<Option<&'a T>> {
        self.check_version(list)?;
        let element = list.get(self.position);
        if element.is_some() {
            self.position += 1;
        }
        Ok(element)
    }

    /// Rewinds to the first element.
    pub fn reset<T>(&mut self, list: &PagedList<T>) -> Result<()> {
        self.check_version(list)?;
        self.position = 0;
        Ok(())
    }

    fn check_version<T>(&self, list: &PagedList<T>) -> Result<()> {
        if list.version() != self.version {
            return Err(CollectionError::ConcurrentModification);
        }
        Ok(())
    }
}
