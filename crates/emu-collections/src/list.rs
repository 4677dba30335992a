use core::cmp::Ordering;
use core::fmt;
use core::ops::{Index, IndexMut};

use tracing::trace;

use crate::iter::{Cursor, IntoIter, Iter};
use crate::{CollectionError, Result};

/// A growable list stored as a table of fixed-size pages.
///
/// Growing never moves existing elements: a new page slot is appended instead of reallocating one
/// large buffer. Inserting or removing in the middle only touches the pages at and after the
/// affected position, one page at a time.
///
/// Pages are allocated on first write and released by [`PagedList::clear`]. Every page that
/// covers `[0, len)` is allocated, and every page before the one holding the last element is
/// full.
///
/// Each mutation bumps an internal version so that detached [`Cursor`]s can detect that the list
/// changed underneath them.
#[derive(Clone)]
pub struct PagedList<T> {
    pages: Vec<Option<Vec<T>>>,
    page_size: usize,
    len: usize,
    version: u64,
}

impl<T> PagedList<T> {
    pub const DEFAULT_PAGE_SIZE: usize = 16;

    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            len: 0,
            version: 0,
        }
    }

    /// Creates an empty list with page slots for at least `capacity` elements.
    ///
    /// Only the slots are reserved; page storage is still allocated on first write.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut list = Self::new();
        list.ensure_capacity(capacity);
        list
    }

    pub fn with_page_size(page_size: usize) -> Result<Self> {
        Self::with_capacity_and_page_size(0, page_size)
    }

    pub fn with_capacity_and_page_size(capacity: usize, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(CollectionError::InvalidPageSize { page_size });
        }
        let mut list = Self {
            pages: Vec::new(),
            page_size,
            len: 0,
            version: 0,
        };
        list.ensure_capacity(capacity);
        Ok(list)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current page table can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.pages.len() * self.page_size
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages whose storage has been allocated.
    pub fn allocated_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.is_some()).count()
    }

    /// Grows the page table so that it can hold at least `capacity` elements. Never shrinks.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let page_count = capacity.div_ceil(self.page_size);
        if page_count > self.pages.len() {
            self.pages.resize_with(page_count, || None);
        }
    }

    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        (index / self.page_size, index % self.page_size)
    }

    fn page_mut(&mut self, page: usize) -> &mut Vec<T> {
        let page_size = self.page_size;
        self.pages[page].get_or_insert_with(|| {
            trace!(page, page_size, "allocating list page");
            Vec::with_capacity(page_size)
        })
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let (page, offset) = self.locate(index);
        self.pages[page].as_ref()?.get(offset)
    }

    pub fn try_get(&self, index: usize) -> Result<&T> {
        self.check_index(index)?;
        self.get(index).ok_or(CollectionError::IndexOutOfRange {
            index,
            len: self.len,
        })
    }

    /// Replaces the element at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        self.check_index(index)?;
        let (page, offset) = self.locate(index);
        let old = core::mem::replace(&mut self.page_mut(page)[offset], value);
        self.bump_version();
        Ok(old)
    }

    /// Appends `item`, adding one page slot if the list is at capacity.
    pub fn push(&mut self, item: T) {
        self.insert_unchecked(self.len, item);
    }

    /// Inserts `item` at `index`, shifting later elements right by one.
    ///
    /// `index` may equal `len`, which appends.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        if index > self.len {
            return Err(CollectionError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.insert_unchecked(index, item);
        Ok(())
    }

    fn insert_unchecked(&mut self, index: usize, item: T) {
        if self.len == self.capacity() {
            self.pages.push(None);
        }

        // Each full page hands its last element to the next page; the first page with room
        // absorbs the carry. Since `len < capacity` such a page always exists.
        let page_size = self.page_size;
        let (mut page, mut offset) = self.locate(index);
        let mut carry = item;
        loop {
            let elements = self.page_mut(page);
            if elements.len() < page_size {
                elements.insert(offset, carry);
                break;
            }
            elements[offset..].rotate_right(1);
            carry = core::mem::replace(&mut elements[offset], carry);
            page += 1;
            offset = 0;
        }

        self.len += 1;
        self.bump_version();
    }

    /// Removes and returns the element at `index`, shifting later elements left by one.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;

        let (mut page, offset) = self.locate(index);
        let removed = self.page_mut(page).remove(offset);

        // Pull the head of each following page back into the tail of the one before it.
        while let Some(Some(next)) = self.pages.get_mut(page + 1) {
            if next.is_empty() {
                break;
            }
            let head = next.remove(0);
            self.page_mut(page).push(head);
            page += 1;
        }

        self.len -= 1;
        self.bump_version();
        Ok(removed)
    }

    /// Removes the first element equal to `item`. Returns whether one was found.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(item).is_some()
    }

    /// Index of the first element equal to `item`. Unallocated pages are skipped without being
    /// scanned.
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.pages.iter().enumerate().find_map(|(page, elements)| {
            let offset = elements.as_ref()?.iter().position(|e| e == item)?;
            Some(page * self.page_size + offset)
        })
    }

    /// Releases every page. The page table keeps its length, so capacity is unchanged.
    pub fn clear(&mut self) {
        for page in &mut self.pages {
            *page = None;
        }
        self.len = 0;
        self.bump_version();
    }

    /// Clones every element into `destination[offset..offset + len]`.
    pub fn copy_to(&self, destination: &mut [T], offset: usize) -> Result<()>
    where
        T: Clone,
    {
        let available = destination.len().saturating_sub(offset);
        if offset > destination.len() || available < self.len {
            return Err(CollectionError::DestinationTooSmall {
                offset,
                len: self.len,
                available,
            });
        }

        let mut dst = &mut destination[offset..offset + self.len];
        for elements in self.pages.iter().flatten() {
            if dst.is_empty() {
                break;
            }
            let take = elements.len().min(dst.len());
            dst[..take].clone_from_slice(&elements[..take]);
            dst = &mut dst[take..];
        }
        Ok(())
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.pages, self.len)
    }

    /// Returns a detached cursor that fails once the list is modified.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.version)
    }

    /// Binary searches a list sorted according to `f`.
    ///
    /// Returns `Ok(index)` of a matching element or `Err(index)` of the position where a matching
    /// element could be inserted while keeping the order.
    pub fn binary_search_by<F>(&self, mut f: F) -> core::result::Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut low = 0;
        let mut high = self.len;
        while low < high {
            let mid = low + (high - low) / 2;
            let Some(element) = self.get(mid) else {
                break;
            };
            match f(element) {
                Ordering::Equal => return Ok(mid),
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }
        Err(low)
    }

    pub fn binary_search_by_key<K, F>(
        &self,
        key: &K,
        mut f: F,
    ) -> core::result::Result<usize, usize>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.binary_search_by(|element| f(element).cmp(key))
    }

    pub fn binary_search(&self, value: &T) -> core::result::Result<usize, usize>
    where
        T: Ord,
    {
        self.binary_search_by(|element| element.cmp(value))
    }
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PagedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for PagedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for PagedList<T> {}

impl<T> Index<usize> for PagedList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(element) => element,
            None => panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.len
            ),
        }
    }
}

impl<T> IndexMut<usize> for PagedList<T> {
    /// Mutable access counts as a modification for any outstanding [`Cursor`].
    fn index_mut(&mut self, index: usize) -> &mut T {
        if index >= self.len {
            panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.len
            );
        }
        self.bump_version();
        let (page, offset) = self.locate(index);
        &mut self.page_mut(page)[offset]
    }
}

impl<T> Extend<T> for PagedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> FromIterator<T> for PagedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a, T> IntoIterator for &'a PagedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T> IntoIterator for PagedList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter::new(self.pages, self.len)
    }
}
