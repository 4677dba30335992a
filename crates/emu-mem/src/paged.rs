use core::fmt;
use core::ops::{Index, IndexMut, Range};
use std::cell::Cell;
use std::io::{ErrorKind, Read};

use tracing::{debug, trace};

use crate::{AddressSpace, MemoryError, Result};

/// Construction options for [`PagedMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagedMemoryOptions {
    /// Granularity of lazy allocation in bytes. Must be non-zero.
    pub page_size: usize,
}

impl Default for PagedMemoryOptions {
    fn default() -> Self {
        Self {
            page_size: PagedMemory::DEFAULT_PAGE_SIZE,
        }
    }
}

/// The page most recently resolved by an access: page `index` covers `[start, end)`.
///
/// `end` is clamped to the memory size so a run computed from the window never leaves valid
/// memory. The initial window is empty and never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    index: usize,
    start: u64,
    end: u64,
}

impl PageWindow {
    const EMPTY: Self = Self {
        index: 0,
        start: 0,
        end: 0,
    };

    #[inline]
    fn contains(&self, address: u64, len: usize) -> bool {
        address >= self.start && address + len as u64 <= self.end
    }
}

/// Resolved location of a single address.
#[derive(Debug, Clone, Copy)]
struct Slot {
    page: usize,
    offset: usize,
    /// Bytes from `offset` to the end of the page window.
    available: usize,
}

/// Fixed-size, byte-addressable memory backed by lazily allocated pages.
///
/// Pages are only materialized by writes; reading an untouched page yields zeroes without
/// allocating. Sequential accesses are served from a one-entry page cache so that consecutive
/// bytes on the same page skip the division and page-table lookup. The cache never changes an
/// observable result.
///
/// The cache lives in a [`Cell`], so `PagedMemory` is `Send` but not `Sync`: callers serialize
/// access.
#[derive(Clone)]
pub struct PagedMemory {
    size: u64,
    page_size: usize,
    pages: Vec<Option<Box<[u8]>>>,
    window: Cell<PageWindow>,
}

impl PagedMemory {
    pub const DEFAULT_SIZE: u64 = 4096;
    pub const DEFAULT_PAGE_SIZE: usize = 4096;

    /// Creates `size` bytes of zeroed memory with the default page size.
    pub fn new(size: u64) -> Result<Self> {
        Self::with_options(size, PagedMemoryOptions::default())
    }

    pub fn with_options(size: u64, options: PagedMemoryOptions) -> Result<Self> {
        let page_size = validate_page_size(options.page_size)?;
        let page_size_u64 = page_size as u64;
        let page_count_u64 = size
            .checked_add(page_size_u64 - 1)
            .ok_or(MemoryError::SizeTooLarge { size })?
            / page_size_u64;
        let page_count =
            usize::try_from(page_count_u64).map_err(|_| MemoryError::SizeTooLarge { size })?;

        Ok(Self {
            size,
            page_size,
            pages: vec![None; page_count],
            window: Cell::new(PageWindow::EMPTY),
        })
    }

    /// Drains `reader` to end-of-stream; address 0 is the first byte read.
    ///
    /// The resulting size is the number of bytes actually read, so the final page may be only
    /// partially valid. The reader is not closed; pass `&mut reader` to keep using it.
    pub fn from_reader<R: Read>(mut reader: R, options: PagedMemoryOptions) -> Result<Self> {
        let page_size = validate_page_size(options.page_size)?;
        let mut pages = Vec::new();
        let mut size = 0u64;

        loop {
            let mut page = vec![0u8; page_size].into_boxed_slice();
            let filled = fill_page(&mut reader, &mut page)?;
            if filled == 0 {
                break;
            }

            size += filled as u64;
            pages.push(Some(page));

            // `fill_page` only returns a short count at end-of-stream.
            if filled < page_size {
                break;
            }
        }

        debug!(size, pages = pages.len(), page_size, "loaded memory image");

        Ok(Self {
            size,
            page_size,
            pages,
            window: Cell::new(PageWindow::EMPTY),
        })
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages that have been materialized.
    pub fn allocated_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.is_some()).count()
    }

    pub fn read_u8(&self, address: u64) -> Result<u8> {
        self.check_range(address, 1)?;
        Ok(self.byte(address))
    }

    pub fn write_u8(&mut self, address: u64, value: u8) -> Result<()> {
        self.check_range(address, 1)?;
        *self.byte_mut(address) = value;
        Ok(())
    }

    pub fn read_u16(&self, address: u64) -> Result<u16> {
        self.read_array(address).map(u16::from_be_bytes)
    }

    pub fn write_u16(&mut self, address: u64, value: u16) -> Result<()> {
        self.write_array(address, value.to_be_bytes())
    }

    pub fn read_u32(&self, address: u64) -> Result<u32> {
        self.read_array(address).map(u32::from_be_bytes)
    }

    pub fn write_u32(&mut self, address: u64, value: u32) -> Result<()> {
        self.write_array(address, value.to_be_bytes())
    }

    pub fn read_u64(&self, address: u64) -> Result<u64> {
        self.read_array(address).map(u64::from_be_bytes)
    }

    pub fn write_u64(&mut self, address: u64, value: u64) -> Result<()> {
        self.write_array(address, value.to_be_bytes())
    }

    /// Copies `length` bytes at `address` into `buffer[index..index + length]`.
    ///
    /// Both ranges are validated before anything is copied.
    pub fn read_bytes(
        &self,
        buffer: &mut [u8],
        index: usize,
        address: u64,
        length: usize,
    ) -> Result<()> {
        let window = buffer_window(buffer.len(), index, length)?;
        self.read_into(address, &mut buffer[window])
    }

    /// Copies `buffer[index..index + length]` into memory at `address`.
    ///
    /// Both ranges are validated before anything is copied.
    pub fn write_bytes(
        &mut self,
        buffer: &[u8],
        index: usize,
        address: u64,
        length: usize,
    ) -> Result<()> {
        let window = buffer_window(buffer.len(), index, length)?;
        self.write_from(address, &buffer[window])
    }

    /// Fills `dst` from memory starting at `address`, one page-sized run at a time.
    pub fn read_into(&self, address: u64, dst: &mut [u8]) -> Result<()> {
        self.check_range(address, dst.len())?;
        let mut remaining = dst;
        let mut cur = address;

        while !remaining.is_empty() {
            let slot = self.locate(cur);
            let take = slot.available.min(remaining.len());

            match &self.pages[slot.page] {
                Some(page) => {
                    remaining[..take].copy_from_slice(&page[slot.offset..slot.offset + take])
                }
                None => remaining[..take].fill(0),
            }

            cur += take as u64;
            remaining = &mut remaining[take..];
        }

        Ok(())
    }

    /// Writes all of `src` to memory starting at `address`, one page-sized run at a time.
    pub fn write_from(&mut self, address: u64, src: &[u8]) -> Result<()> {
        self.check_range(address, src.len())?;
        let mut remaining = src;
        let mut cur = address;

        while !remaining.is_empty() {
            let slot = self.locate(cur);
            let take = slot.available.min(remaining.len());

            let page = self.page_mut(slot.page);
            page[slot.offset..slot.offset + take].copy_from_slice(&remaining[..take]);

            cur += take as u64;
            remaining = &remaining[take..];
        }

        Ok(())
    }

    fn check_range(&self, address: u64, len: usize) -> Result<()> {
        let out_of_range = MemoryError::OutOfRange {
            address,
            len,
            size: self.size,
        };
        let end = match address.checked_add(len as u64) {
            Some(end) => end,
            None => return Err(out_of_range),
        };
        if end > self.size {
            return Err(out_of_range);
        }
        Ok(())
    }

    /// Resolves an in-range `address`, refreshing the page window on a miss.
    #[inline]
    fn locate(&self, address: u64) -> Slot {
        let mut window = self.window.get();
        if !window.contains(address, 1) {
            let page_size = self.page_size as u64;
            let page = address / page_size;
            let start = page * page_size;
            window = PageWindow {
                // `address < size`, so the page index is below the page count.
                index: page as usize,
                start,
                end: (start + page_size).min(self.size),
            };
            self.window.set(window);
        }

        Slot {
            page: window.index,
            offset: (address - window.start) as usize,
            available: (window.end - address) as usize,
        }
    }

    fn page_mut(&mut self, page: usize) -> &mut [u8] {
        let page_size = self.page_size;
        self.pages[page].get_or_insert_with(|| {
            trace!(page, page_size, "allocating memory page");
            vec![0u8; page_size].into_boxed_slice()
        })
    }

    #[inline]
    fn byte(&self, address: u64) -> u8 {
        let slot = self.locate(address);
        self.pages[slot.page]
            .as_ref()
            .map_or(0, |page| page[slot.offset])
    }

    #[inline]
    fn byte_mut(&mut self, address: u64) -> &mut u8 {
        let slot = self.locate(address);
        &mut self.page_mut(slot.page)[slot.offset]
    }

    fn read_array<const N: usize>(&self, address: u64) -> Result<[u8; N]> {
        self.check_range(address, N)?;
        let mut buf = [0u8; N];

        let window = self.window.get();
        if window.contains(address, N) {
            if let Some(page) = &self.pages[window.index] {
                let offset = (address - window.start) as usize;
                buf.copy_from_slice(&page[offset..offset + N]);
            }
            return Ok(buf);
        }

        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.byte(address + i as u64);
        }
        Ok(buf)
    }

    fn write_array<const N: usize>(&mut self, address: u64, bytes: [u8; N]) -> Result<()> {
        self.check_range(address, N)?;

        let window = self.window.get();
        if window.contains(address, N) {
            let offset = (address - window.start) as usize;
            self.page_mut(window.index)[offset..offset + N].copy_from_slice(&bytes);
            return Ok(());
        }

        for (i, byte) in bytes.into_iter().enumerate() {
            *self.byte_mut(address + i as u64) = byte;
        }
        Ok(())
    }
}

impl Default for PagedMemory {
    fn default() -> Self {
        Self {
            size: Self::DEFAULT_SIZE,
            page_size: Self::DEFAULT_PAGE_SIZE,
            pages: vec![None; 1],
            window: Cell::new(PageWindow::EMPTY),
        }
    }
}

impl fmt::Debug for PagedMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedMemory")
            .field("size", &self.size)
            .field("page_size", &self.page_size)
            .field("allocated_pages", &self.allocated_pages())
            .finish()
    }
}

impl Index<u64> for PagedMemory {
    type Output = u8;

    /// # Panics
    /// Panics if `address >= size`.
    fn index(&self, address: u64) -> &u8 {
        if let Err(err) = self.check_range(address, 1) {
            panic!("{err}");
        }
        let slot = self.locate(address);
        self.pages[slot.page]
            .as_ref()
            .map_or(&0, |page| &page[slot.offset])
    }
}

impl IndexMut<u64> for PagedMemory {
    /// # Panics
    /// Panics if `address >= size`.
    fn index_mut(&mut self, address: u64) -> &mut u8 {
        if let Err(err) = self.check_range(address, 1) {
            panic!("{err}");
        }
        self.byte_mut(address)
    }
}

impl AddressSpace for PagedMemory {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_into(&self, address: u64, dst: &mut [u8]) -> Result<()> {
        PagedMemory::read_into(self, address, dst)
    }

    fn write_from(&mut self, address: u64, src: &[u8]) -> Result<()> {
        PagedMemory::write_from(self, address, src)
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        PagedMemory::read_u8(self, address)
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        PagedMemory::read_u16(self, address)
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        PagedMemory::read_u32(self, address)
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        PagedMemory::read_u64(self, address)
    }

    fn write_u8(&mut self, address: u64, value: u8) -> Result<()> {
        PagedMemory::write_u8(self, address, value)
    }

    fn write_u16(&mut self, address: u64, value: u16) -> Result<()> {
        PagedMemory::write_u16(self, address, value)
    }

    fn write_u32(&mut self, address: u64, value: u32) -> Result<()> {
        PagedMemory::write_u32(self, address, value)
    }

    fn write_u64(&mut self, address: u64, value: u64) -> Result<()> {
        PagedMemory::write_u64(self, address, value)
    }
}

fn validate_page_size(page_size: usize) -> Result<usize> {
    if page_size == 0 {
        return Err(MemoryError::InvalidPageSize { page_size });
    }
    Ok(page_size)
}

/// Validates `buffer[index..index + len]`. `index` must name an element of the buffer even when
/// `len` is zero.
fn buffer_window(buffer_len: usize, index: usize, len: usize) -> Result<Range<usize>> {
    let out_of_range = MemoryError::BufferOutOfRange {
        index,
        len,
        buffer_len,
    };
    if index >= buffer_len {
        return Err(out_of_range);
    }
    match index.checked_add(len) {
        Some(end) if end <= buffer_len => Ok(index..end),
        _ => Err(out_of_range),
    }
}

/// Reads until `page` is full or the stream ends; a short count means end-of-stream.
fn fill_page<R: Read>(reader: &mut R, page: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < page.len() {
        match reader.read(&mut page[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(filled)
}
