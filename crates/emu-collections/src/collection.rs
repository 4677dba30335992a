use crate::iter::Iter;
use crate::{CollectionError, PagedList, Result};

/// Observer for the mutations made through a [`PagedCollection`].
///
/// Every method has an empty default, so implementors only override what they care about.
/// Hooks run after the change has been applied.
pub trait CollectionHooks<T> {
    fn inserted(&mut self, _index: usize, _item: &T) {}

    fn removed(&mut self, _index: usize, _item: &T) {}

    fn replaced(&mut self, _index: usize, _old: &T, _new: &T) {}

    /// The collection went from non-empty to empty.
    fn cleared(&mut self) {}

    /// The outermost bulk operation ended after at least one change. Per-item hooks are not
    /// called for changes made inside a bulk operation.
    fn bulk_changed(&mut self) {}
}

impl<T> CollectionHooks<T> for () {}

/// A [`PagedList`] whose mutations are reported to a [`CollectionHooks`] value.
///
/// This is the seam a change-notification layer plugs into: it supplies the hooks and forwards
/// them as events. Bulk operations batch a run of changes into a single
/// [`CollectionHooks::bulk_changed`] call.
#[derive(Debug, Clone)]
pub struct PagedCollection<T, H = ()> {
    items: PagedList<T>,
    hooks: H,
    bulk_depth: usize,
    changed_during_bulk: bool,
}

impl<T, H: CollectionHooks<T>> PagedCollection<T, H> {
    pub fn new(hooks: H) -> Self {
        Self::with_list(PagedList::new(), hooks)
    }

    /// Wraps an existing list. No hooks fire for the elements it already holds.
    pub fn with_list(items: PagedList<T>, hooks: H) -> Self {
        Self {
            items,
            hooks,
            bulk_depth: 0,
            changed_during_bulk: false,
        }
    }

    pub fn items(&self) -> &PagedList<T> {
        &self.items
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn into_parts(self) -> (PagedList<T>, H) {
        (self.items, self.hooks)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.items.contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.items.index_of(item)
    }

    pub fn copy_to(&self, destination: &mut [T], offset: usize) -> Result<()>
    where
        T: Clone,
    {
        self.items.copy_to(destination, offset)
    }

    /// Reserves page slots; requests at or below the current length are ignored.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity > self.items.len() {
            self.items.ensure_capacity(capacity);
        }
    }

    pub fn push(&mut self, item: T) {
        let index = self.items.len();
        self.items.push(item);
        if !self.suppressed() {
            self.hooks.inserted(index, &self.items[index]);
        }
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.items.insert(index, item)?;
        if !self.suppressed() {
            self.hooks.inserted(index, &self.items[index]);
        }
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        let item = self.items.remove_at(index)?;
        if !self.suppressed() {
            self.hooks.removed(index, &item);
        }
        Ok(item)
    }

    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.items.index_of(item) {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        let old = self.items.set(index, value)?;
        if !self.suppressed() {
            self.hooks.replaced(index, &old, &self.items[index]);
        }
        Ok(old)
    }

    pub fn clear(&mut self) {
        let had_items = !self.items.is_empty();
        self.items.clear();
        if had_items && !self.suppressed() {
            self.hooks.cleared();
        }
    }

    pub fn begin_bulk(&mut self) {
        self.bulk_depth += 1;
    }

    /// Closes the innermost bulk operation. Closing the outermost one reports a single
    /// [`CollectionHooks::bulk_changed`] if anything changed while it was open.
    pub fn end_bulk(&mut self) -> Result<()> {
        if self.bulk_depth == 0 {
            return Err(CollectionError::UnbalancedBulkOperation);
        }
        self.bulk_depth -= 1;
        if self.bulk_depth == 0 && self.changed_during_bulk {
            self.changed_during_bulk = false;
            self.hooks.bulk_changed();
        }
        Ok(())
    }

    pub fn in_bulk(&self) -> bool {
        self.bulk_depth > 0
    }

    /// Appends every item as one bulk operation.
    pub fn extend_from<I: IntoIterator<Item = T>>(&mut self, items: I) {
        self.begin_bulk();
        for item in items {
            self.push(item);
        }
        // Balanced with the `begin_bulk` above.
        let _ = self.end_bulk();
    }

    /// Records a change made during a bulk operation; returns whether per-item hooks are muted.
    fn suppressed(&mut self) -> bool {
        if self.bulk_depth > 0 {
            self.changed_during_bulk = true;
            return true;
        }
        false
    }
}

impl<T, H: Default> Default for PagedCollection<T, H> {
    fn default() -> Self {
        Self {
            items: PagedList::new(),
            hooks: H::default(),
            bulk_depth: 0,
            changed_during_bulk: false,
        }
    }
}

impl<T, H: CollectionHooks<T>> Extend<T> for PagedCollection<T, H> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.extend_from(iter);
    }
}

impl<'a, T, H> IntoIterator for &'a PagedCollection<T, H> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.items.iter()
    }
}
