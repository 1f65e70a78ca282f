//! Cache-line aligned scratch memory for the hash oracle.
//!
//! A region over-allocates 63 bytes of slack and hands out the first 64-byte
//! aligned address inside the allocation. No hugepages or mmap are used.

use alloc::vec::Vec;
use core::fmt;

use crate::oracle::OracleError;

/// Alignment of the usable pointer.
pub const SCRATCH_ALIGN: usize = 64;

const SLACK: usize = SCRATCH_ALIGN - 1;

/// One scratch allocation.
///
/// Holds the whole `size + 63` byte buffer and the offset of the first
/// 64-byte aligned byte inside it. An empty region (no allocation) is what
/// a failed [`acquire`] returns.
///
/// [`acquire`]: ScratchRegion::acquire
#[derive(Default)]
pub struct ScratchRegion {
    buf: Vec<u8>,
    offset: usize,
    aligned_size: usize,
}

impl ScratchRegion {
    /// A region holding no memory.
    pub const fn empty() -> Self {
        ScratchRegion {
            buf: Vec::new(),
            offset: 0,
            aligned_size: 0,
        }
    }

    /// Allocate `size` usable bytes aligned to [`SCRATCH_ALIGN`].
    ///
    /// On failure the returned region is empty. The memory is zeroed.
    pub fn acquire(size: usize) -> Self {
        let Some(base_size) = size.checked_add(SLACK) else {
            return Self::empty();
        };

        let mut buf = Vec::new();
        if buf.try_reserve_exact(base_size).is_err() {
            return Self::empty();
        }
        buf.resize(base_size, 0);

        let offset = buf.as_ptr().align_offset(SCRATCH_ALIGN);
        if offset > SLACK {
            return Self::empty();
        }

        ScratchRegion {
            buf,
            offset,
            aligned_size: size,
        }
    }

    /// Free the allocation and reset to empty. Releasing an empty region
    /// does nothing.
    pub fn release(&mut self) {
        self.buf = Vec::new();
        self.offset = 0;
        self.aligned_size = 0;
    }

    /// True when the region holds no allocation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Usable bytes behind the aligned pointer.
    #[inline]
    pub fn aligned_size(&self) -> usize {
        self.aligned_size
    }

    /// Bytes in the underlying allocation, slack included.
    #[inline]
    pub fn base_size(&self) -> usize {
        self.buf.len()
    }

    /// The aligned pointer, or null for an empty region.
    pub fn as_ptr(&self) -> *const u8 {
        if self.is_empty() {
            core::ptr::null()
        } else {
            self.as_slice().as_ptr()
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.is_empty() {
            return &[];
        }
        &self.buf[self.offset..self.offset + self.aligned_size]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.is_empty() {
            return &mut [];
        }
        &mut self.buf[self.offset..self.offset + self.aligned_size]
    }
}

impl fmt::Debug for ScratchRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchRegion")
            .field("offset", &self.offset)
            .field("aligned_size", &self.aligned_size)
            .field("base_size", &self.base_size())
            .finish()
    }
}

/// Scratch memory kept alive across scans.
///
/// The region only grows; a scan that needs no more than what is already
/// held reuses it without touching the allocator.
#[derive(Debug, Default)]
pub struct ScratchArena {
    region: ScratchRegion,
}

impl ScratchArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena pre-sized to `size` usable bytes (empty if allocation fails).
    pub fn with_capacity(size: usize) -> Self {
        ScratchArena {
            region: ScratchRegion::acquire(size),
        }
    }

    /// A region with at least `size` usable bytes.
    pub fn region(&mut self, size: usize) -> Result<&mut ScratchRegion, OracleError> {
        if self.region.is_empty() || self.region.aligned_size() < size {
            self.region.release();
            self.region = ScratchRegion::acquire(size);
            if self.region.is_empty() {
                return Err(OracleError::Allocation);
            }
        }
        Ok(&mut self.region)
    }

    /// Usable bytes currently held.
    pub fn capacity(&self) -> usize {
        self.region.aligned_size()
    }

    /// Give the memory back to the allocator.
    pub fn release(&mut self) {
        self.region.release();
    }
}
