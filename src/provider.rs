//! Sources of heap memory

use crate::{consts, util};

/// Supplies the heap with memory, one fixed-size region at a time
///
/// Implementations behave like a page-granularity `brk`: every successful [`extend`] appends
/// [`REGION_SIZE`] bytes right after the previously committed ones, so the committed memory is
/// always one contiguous run of bytes. Memory is never handed back.
///
/// [`extend`]: trait.RegionProvider.html#tymethod.extend
/// [`REGION_SIZE`]: constant.REGION_SIZE.html
pub trait RegionProvider {
    /// Appends one region and returns the offset of its first byte, or `None` if the provider is
    /// exhausted. A failed call must leave the committed memory untouched.
    fn extend(&mut self) -> Option<usize>;

    /// Offset right past the most recently committed region
    fn end(&self) -> usize;

    /// The committed bytes, `0..self.end()`
    fn memory(&self) -> &[u8];

    /// The committed bytes, `0..self.end()`
    fn memory_mut(&mut self) -> &mut [u8];
}

/// A growable, heap-backed provider with an optional cap on the number of regions
#[derive(Debug)]
pub struct Arena {
    memory: Vec<u8>,
    max_regions: Option<usize>,
}

impl Arena {
    /// An arena that refuses to grow past `max_regions` regions
    pub fn new(max_regions: usize) -> Self {
        Arena {
            memory: Vec::new(),
            max_regions: Some(max_regions),
        }
    }

    /// An arena that only fails when the global allocator does
    pub fn unbounded() -> Self {
        Arena {
            memory: Vec::new(),
            max_regions: None,
        }
    }

    /// Number of regions committed so far
    pub fn regions(&self) -> usize {
        self.memory.len() / consts::REGION_SIZE
    }
}

impl Default for Arena {
    fn default() -> Self {
        Arena::new(consts::DEFAULT_MAX_REGIONS)
    }
}

impl RegionProvider for Arena {
    fn extend(&mut self) -> Option<usize> {
        if self.max_regions.map_or(false, |max| self.regions() >= max) {
            return None;
        }

        let start = self.memory.len();
        self.memory.try_reserve_exact(consts::REGION_SIZE).ok()?;
        self.memory.resize(start + consts::REGION_SIZE, 0);

        Some(start)
    }

    fn end(&self) -> usize {
        self.memory.len()
    }

    fn memory(&self) -> &[u8] {
        &self.memory
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }
}

/// Hands out regions carved from a caller-supplied buffer
///
/// The start of the buffer is rounded up to [`ALIGN_SIZE`] bytes so that payload offsets are also
/// aligned addresses; trailing bytes that don't make up a whole region are never used. Align the
/// buffer to `ALIGN_SIZE` bytes to avoid losing the padding.
///
/// [`ALIGN_SIZE`]: constant.ALIGN_SIZE.html
#[derive(Debug)]
pub struct SliceProvider<'a> {
    memory: &'a mut [u8],
    committed: usize,
}

impl<'a> SliceProvider<'a> {
    /// Wraps `memory`
    pub fn new(memory: &'a mut [u8]) -> Self {
        let addr = memory.as_ptr() as usize;
        let (aligned, _) = util::round_up(addr, consts::ALIGN_SIZE, 0);
        let padding = (aligned - addr).min(memory.len());

        SliceProvider {
            memory: &mut memory[padding..],
            committed: 0,
        }
    }

    /// Number of regions that can still be handed out
    pub fn remaining_regions(&self) -> usize {
        (self.memory.len() - self.committed) / consts::REGION_SIZE
    }
}

impl RegionProvider for SliceProvider<'_> {
    fn extend(&mut self) -> Option<usize> {
        if self.remaining_regions() == 0 {
            return None;
        }

        let start = self.committed;
        self.committed += consts::REGION_SIZE;
        Some(start)
    }

    fn end(&self) -> usize {
        self.committed
    }

    fn memory(&self) -> &[u8] {
        &self.memory[..self.committed]
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory[..self.committed]
    }
}
