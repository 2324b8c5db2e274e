//! Memory Bridge
//!
//! The shared linear buffer the compute module writes instruction streams
//! into, and typed little-endian views over it.
//!
//! Growing the buffer reallocates its storage and bumps an epoch, the same
//! way a host detaches the old `ArrayBuffer` when linear memory grows. Views
//! are never cached: [`MemoryBridge::view`] borrows the live region on every
//! call, so a read always sees the current length. While a view is alive the
//! buffer cannot grow.

use std::cell::{Cell, Ref, RefCell};
use std::marker::PhantomData;
use std::rc::Rc;

/// Size of one linear-memory page
pub const PAGE_SIZE: usize = 64 * 1024;

/// Allocation alignment
const ALIGN: usize = 8;

/// Memory errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("growing to {requested} pages exceeds the limit of {limit}")]
    LimitExceeded { requested: usize, limit: usize },

    #[error("buffer is borrowed by a live view")]
    Busy,

    #[error("access of {len} bytes at offset {offset} is outside the {size}-byte buffer")]
    OutOfBounds { offset: usize, len: usize, size: usize },
}

#[derive(Debug)]
struct Region {
    bytes: Vec<u8>,
    epoch: u64,
    next_free: usize,
    max_pages: usize,
}

/// Growable shared buffer.
///
/// Cloning yields another handle to the same region.
#[derive(Debug, Clone)]
pub struct SharedBuffer {
    region: Rc<RefCell<Region>>,
}

impl SharedBuffer {
    /// Create a buffer of `initial_pages` that may grow to `max_pages`
    pub fn new(initial_pages: usize, max_pages: usize) -> Self {
        let max_pages = max_pages.max(initial_pages);
        Self {
            region: Rc::new(RefCell::new(Region {
                bytes: vec![0; initial_pages * PAGE_SIZE],
                epoch: 0,
                next_free: 0,
                max_pages,
            })),
        }
    }

    /// Current size in bytes
    pub fn byte_len(&self) -> usize {
        self.region.borrow().bytes.len()
    }

    /// Current size in pages
    pub fn pages(&self) -> usize {
        self.byte_len() / PAGE_SIZE
    }

    /// Reallocation counter
    pub fn epoch(&self) -> u64 {
        self.region.borrow().epoch
    }

    /// Do both handles point at the same region?
    pub fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        Rc::ptr_eq(&self.region, &other.region)
    }

    /// Grow by `delta` pages, returning the previous page count
    pub fn grow(&self, delta: usize) -> Result<usize, MemoryError> {
        let mut region = self.region.try_borrow_mut().map_err(|_| MemoryError::Busy)?;
        let old_pages = region.bytes.len() / PAGE_SIZE;
        let requested = old_pages + delta;
        if requested > region.max_pages {
            return Err(MemoryError::LimitExceeded { requested, limit: region.max_pages });
        }
        if delta == 0 {
            return Ok(old_pages);
        }

        // Fresh storage: anything derived from the old allocation is dead
        let mut bytes = Vec::with_capacity(requested * PAGE_SIZE);
        bytes.extend_from_slice(&region.bytes);
        bytes.resize(requested * PAGE_SIZE, 0);
        region.bytes = bytes;
        region.epoch += 1;

        tracing::debug!(old_pages, new_pages = requested, epoch = region.epoch, "shared buffer grown");
        Ok(old_pages)
    }

    /// Reserve `len` bytes, growing the buffer when needed.
    ///
    /// Returns the offset of the reservation.
    pub fn allocate(&self, len: usize) -> Result<usize, MemoryError> {
        let (offset, end, size) = {
            let region = self.region.try_borrow().map_err(|_| MemoryError::Busy)?;
            let offset = region.next_free.next_multiple_of(ALIGN);
            (offset, offset + len, region.bytes.len())
        };
        if end > size {
            let needed = end.div_ceil(PAGE_SIZE) - size / PAGE_SIZE;
            self.grow(needed)?;
        }
        let mut region = self.region.try_borrow_mut().map_err(|_| MemoryError::Busy)?;
        region.next_free = end;
        Ok(offset)
    }

    /// Copy bytes into the buffer at `offset`
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        let mut region = self.region.try_borrow_mut().map_err(|_| MemoryError::Busy)?;
        let size = region.bytes.len();
        let end = offset.checked_add(data.len()).filter(|&end| end <= size).ok_or(
            MemoryError::OutOfBounds { offset, len: data.len(), size },
        )?;
        region.bytes[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Allocate and copy in one step, returning `(offset, len)`
    pub fn write_bytes(&self, data: &[u8]) -> Result<(usize, usize), MemoryError> {
        let offset = self.allocate(data.len())?;
        self.write(offset, data)?;
        Ok((offset, data.len()))
    }

    /// Forget all allocations (the bytes are kept)
    pub fn reset(&self) {
        self.region.borrow_mut().next_free = 0;
    }
}

/// Element types a view can be taken over
pub trait ViewElement: Copy + sealed::Sealed {
    /// Width in bytes
    const SIZE: usize;

    /// Decode from exactly `SIZE` little-endian bytes
    fn from_le(bytes: &[u8]) -> Self;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! view_element {
    ($($ty:ty),*) => {$(
        impl sealed::Sealed for $ty {}

        impl ViewElement for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn from_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(&bytes[..Self::SIZE]);
                <$ty>::from_le_bytes(raw)
            }
        }
    )*};
}

view_element!(u8, u16, u32, i32, f32, f64);

/// Typed view over the live region
pub struct TypedView<'a, T> {
    region: Ref<'a, Region>,
    marker: PhantomData<T>,
}

impl<T: ViewElement> TypedView<'_, T> {
    /// Number of whole elements
    pub fn len(&self) -> usize {
        self.region.bytes.len() / T::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the underlying buffer in bytes
    pub fn byte_len(&self) -> usize {
        self.region.bytes.len()
    }

    /// Element at an element index
    pub fn get(&self, index: usize) -> Option<T> {
        let start = index.checked_mul(T::SIZE)?;
        self.region.bytes.get(start..start + T::SIZE).map(T::from_le)
    }

    /// Element at a byte offset (unaligned)
    pub fn read_at(&self, offset: usize) -> Result<T, MemoryError> {
        self.bytes(offset, T::SIZE).map(T::from_le)
    }

    /// Raw byte range
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&[u8], MemoryError> {
        let size = self.region.bytes.len();
        offset.checked_add(len)
            .and_then(|end| self.region.bytes.get(offset..end))
            .ok_or(MemoryError::OutOfBounds { offset, len, size })
    }
}

/// Typed access to the shared buffer with freshness tracking
#[derive(Debug)]
pub struct MemoryBridge {
    buffer: SharedBuffer,
    /// (byte length, epoch) seen by the last view
    observed: Cell<Option<(usize, u64)>>,
    refreshes: Cell<u64>,
}

impl MemoryBridge {
    pub fn new(buffer: SharedBuffer) -> Self {
        Self {
            buffer,
            observed: Cell::new(None),
            refreshes: Cell::new(0),
        }
    }

    /// The buffer views are taken over
    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    /// Swap in a different buffer (the host handed over new memory)
    pub fn update_shared_memory(&mut self, buffer: SharedBuffer) {
        tracing::debug!(bytes = buffer.byte_len(), "shared memory replaced");
        self.buffer = buffer;
        self.observed.set(None);
    }

    /// Acquire a typed view, re-deriving it if the buffer changed.
    pub fn view<T: ViewElement>(&self) -> Result<TypedView<'_, T>, MemoryError> {
        let region = self.buffer.region.try_borrow().map_err(|_| MemoryError::Busy)?;
        let current = (region.bytes.len(), region.epoch);
        if self.observed.get() != Some(current) {
            self.refreshes.set(self.refreshes.get() + 1);
            tracing::trace!(bytes = current.0, epoch = current.1, "memory view refreshed");
            self.observed.set(Some(current));
        }
        Ok(TypedView { region, marker: PhantomData })
    }

    /// How many times a view had to be re-acquired
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.get()
    }
}
