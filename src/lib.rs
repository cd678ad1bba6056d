//! A boundary-tag heap allocator with a size-ordered free list and immediate coalescing
//!
//! # Features
//!
//! - One contiguous, append-only heap that grows a fixed-size region at a time through a pluggable
//!   [`RegionProvider`]
//!
//! - Every block carries a header *and* a footer, so both physical neighbors of a block can be
//!   found in constant time and merged as soon as the block is freed
//!
//! - The free list is kept sorted by block size; the first block that fits is therefore the
//!   *smallest* block that fits (best fit). Among blocks of equal size the most recently freed one
//!   is served first
//!
//! - Pointers handed to [`Heap::free`] and [`Heap::resize`] are validated (bounds, tags, allocated
//!   bit, header / footer agreement) before the heap is touched. Since tags could have been
//!   written into a payload, a pointer must also land on a block found by walking the heap, which
//!   makes validation linear in the number of blocks
//!
//! # Example
//!
//! ```
//! use tagalloc::{ErrorKind, Heap};
//!
//! let mut heap = Heap::new();
//!
//! let ptr = heap.allocate(25).unwrap();
//! heap.payload_mut(ptr).unwrap().copy_from_slice(b"twenty-five bytes of data");
//!
//! // grows into a new block; the old contents are copied over
//! let ptr = heap.resize(ptr, 100).unwrap().unwrap();
//! assert_eq!(&heap.payload(ptr).unwrap()[..25], b"twenty-five bytes of data");
//!
//! heap.free(ptr).unwrap();
//!
//! // double free
//! assert_eq!(heap.free(ptr).unwrap_err().kind(), ErrorKind::InvalidArgument);
//! # assert!(heap.check().is_ok());
//! ```
//!
//! # Heap layout
//!
//! ``` text
//!  start                                                                          end
//!  | prologue | header | payload ...           | footer | header | ... | epilogue |
//!  |  8 bytes | 8      |                       | 8      | 8      |     | 8        |
//!                      ^
//!                      `Ptr` (16-byte aligned offset)
//! ```
//!
//! The prologue is a zero-size allocated header and the epilogue a zero-size allocated footer;
//! neither is ever merged, so coalescing never needs to special case the edges of the heap. When
//! the heap grows, the old epilogue becomes the header of the new region's block.
//!
//! Each tag is a single 64-bit word holding the block size (its low bit is the allocated flag),
//! the size the user asked for and a fixed marker that differs between headers and footers. Free
//! blocks store their free-list links in the first 16 bytes of their payload, which is why no
//! block is ever smaller than [`MIN_BLOCK_SIZE`] bytes.
//!
//! # Limitations
//!
//! A [`Heap`] is a plain value: it is not thread safe and its methods take `&mut self`. Wrap it in
//! a lock if it must be shared. The heap never returns memory to its provider and `resize` always
//! moves the allocation (allocate, copy, free).
//!
//! Blocks must be smaller than [`MAX_BLOCK_SIZE`] bytes, including the tags; bigger requests fail
//! without growing the heap.
//!
//! # Cargo features
//!
//! - `ufmt`: implements `ufmt::uDebug` for [`Ptr`], [`BlockInfo`] and [`HeapStats`]

#![deny(missing_docs)]
#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]

use core::{cmp, fmt};

use tracing::{debug, trace, warn};
#[cfg(feature = "ufmt")]
use ufmt::derive::uDebug;

pub use crate::{
    consts::{
        ALIGN_SIZE, DEFAULT_MAX_REGIONS, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, REGION_SIZE, WORD_SIZE,
    },
    error::{ErrorKind, HeapError, Inconsistency, PointerFault, Result},
    provider::{Arena, RegionProvider, SliceProvider},
};
use crate::{
    block::{Block, BoundaryTag},
    free_block::FreeBlock,
};

mod block;
mod consts;
mod error;
mod free_block;
mod provider;
mod util;

/// Handle to an allocation: the offset of its payload within the provider's memory
///
/// A `Ptr` is only meaningful for the heap that returned it. Forged handles (see
/// [`Ptr::from_offset`]) are safe to pass around; [`Heap::free`] and friends reject them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "ufmt", derive(uDebug))]
pub struct Ptr(usize);

impl Ptr {
    /// Builds a handle from a raw payload offset
    pub fn from_offset(offset: usize) -> Self {
        Ptr(offset)
    }

    /// The payload offset
    pub fn offset(self) -> usize {
        self.0
    }
}

/// A snapshot of one block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ufmt", derive(uDebug))]
pub struct BlockInfo {
    /// Where the payload starts
    pub ptr: Ptr,
    /// Block size in bytes, tags included
    pub size: usize,
    /// Bytes requested by the user; `0` for free blocks
    pub requested: usize,
    /// Whether the block is in use
    pub allocated: bool,
}

impl BlockInfo {
    fn read(memory: &[u8], block: Block) -> Self {
        let header = block.header(memory);

        BlockInfo {
            ptr: Ptr(block.payload()),
            size: header.size(),
            requested: header.requested(),
            allocated: header.is_allocated(),
        }
    }
}

/// Summary of the heap's state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "ufmt", derive(uDebug))]
pub struct HeapStats {
    /// Bytes obtained from the provider
    pub committed: usize,
    /// Number of regions obtained from the provider
    pub regions: usize,
    /// Number of free blocks
    pub free_blocks: usize,
    /// Sum of the sizes of all free blocks
    pub free_bytes: usize,
    /// Number of allocated blocks
    pub allocated_blocks: usize,
    /// Sum of the sizes of all allocated blocks
    pub allocated_bytes: usize,
}

/// A boundary-tag heap
///
/// The heap owns its provider, and with it every byte of heap memory, including the free-list
/// links that live inside free blocks. It is created empty; the first call to [`allocate`] asks
/// the provider for the first region.
///
/// [`allocate`]: struct.Heap.html#method.allocate
pub struct Heap<P = Arena> {
    provider: P,
    // smallest free block
    free_list: Option<FreeBlock>,
    // offset of the prologue; `None` until the first allocation
    start: Option<usize>,
}

impl Heap<Arena> {
    /* Constructors */
    /// An empty heap backed by a default [`Arena`]
    pub fn new() -> Self {
        Heap::with_provider(Arena::default())
    }
}

impl Default for Heap<Arena> {
    fn default() -> Self {
        Heap::new()
    }
}

impl<P> Heap<P>
where
    P: RegionProvider,
{
    /// An empty heap that will take its memory from `provider`
    pub fn with_provider(provider: P) -> Self {
        Heap {
            provider,
            free_list: None,
            start: None,
        }
    }

    /* Public API */
    /// Allocates a block able to hold `size` bytes
    ///
    /// The first call sets the heap up. Requests are padded with the two tags, raised to
    /// `MIN_BLOCK_SIZE` and rounded up to `ALIGN_SIZE`; a padded size of `MAX_BLOCK_SIZE` or more
    /// fails straight away. Otherwise the heap grows one region at a time until a free block fits
    /// or the provider gives up.
    ///
    /// # Errors
    ///
    /// - [`HeapError::ZeroSize`] if `size` is zero
    /// - [`HeapError::TooLarge`] if the padded request reaches `MAX_BLOCK_SIZE`
    /// - [`HeapError::OutOfMemory`] if the provider can't supply another region
    pub fn allocate(&mut self, size: usize) -> Result<Ptr> {
        self.init()?;

        if size == 0 {
            return Err(HeapError::ZeroSize);
        }

        let need = match util::adjusted_size(size) {
            Some(need) if need < consts::MAX_BLOCK_SIZE => need,
            need => {
                return Err(HeapError::TooLarge {
                    need: need.unwrap_or(usize::MAX),
                    limit: consts::MAX_BLOCK_SIZE,
                });
            }
        };

        let fb = loop {
            if let Some(fb) = self.search(need) {
                break fb;
            }

            self.extend()?;
        };

        self.unlink(fb);

        let memory = self.provider.memory_mut();
        let total = fb.size(memory);
        let block = fb.block();

        // split off the tail when it is big enough to be a block of its own
        let size_of_block = if total >= need + consts::MIN_BLOCK_SIZE {
            let remainder = FreeBlock::from_parts(memory, block.payload() + need, total - need);
            self.insert(remainder);
            need
        } else {
            total
        };

        block.write(self.provider.memory_mut(), size_of_block, size, true);

        trace!(size, block = size_of_block, offset = block.payload(), "allocate");

        Ok(Ptr(block.payload()))
    }

    /// Like [`allocate`](#method.allocate) but the `size` requested bytes are zeroed
    pub fn allocate_zeroed(&mut self, size: usize) -> Result<Ptr> {
        let ptr = self.allocate(size)?;

        let payload = ptr.offset();
        self.provider.memory_mut()[payload..payload + size].fill(0);

        Ok(ptr)
    }

    /// Releases the allocation named by `ptr`
    ///
    /// The block is merged with its free neighbors, if any, and the result goes back into the free
    /// list.
    ///
    /// # Errors
    ///
    /// [`HeapError::InvalidPointer`] if `ptr` doesn't name a live allocation; the heap is left
    /// untouched.
    pub fn free(&mut self, ptr: Ptr) -> Result<()> {
        let block = self.validate(ptr)?;

        self.release(block);

        trace!(offset = ptr.offset(), "free");

        Ok(())
    }

    /// Moves the allocation named by `ptr` into a block able to hold `size` bytes
    ///
    /// `min(size, old requested size)` bytes are copied over before the old block is freed. The
    /// allocation never grows in place, so the returned handle always differs from `ptr`.
    /// A `size` of zero frees the allocation and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`HeapError::InvalidPointer`] if `ptr` doesn't name a live allocation
    /// - the errors of [`allocate`](#method.allocate); the original allocation is left intact
    pub fn resize(&mut self, ptr: Ptr, size: usize) -> Result<Option<Ptr>> {
        let block = self.validate(ptr)?;

        if size == 0 {
            self.release(block);
            trace!(offset = ptr.offset(), "resize to zero");
            return Ok(None);
        }

        let requested = block.header(self.provider.memory()).requested();
        let new = self.allocate(size)?;

        let count = cmp::min(size, requested);
        self.provider
            .memory_mut()
            .copy_within(ptr.offset()..ptr.offset() + count, new.offset());

        self.release(block);

        trace!(from = ptr.offset(), to = new.offset(), size, "resize");

        Ok(Some(new))
    }

    /// The `requested size` bytes of the allocation named by `ptr`
    pub fn payload(&self, ptr: Ptr) -> Result<&[u8]> {
        let block = self.validate(ptr)?;
        let memory = self.provider.memory();
        let requested = block.header(memory).requested();

        Ok(&memory[ptr.offset()..ptr.offset() + requested])
    }

    /// The `requested size` bytes of the allocation named by `ptr`
    pub fn payload_mut(&mut self, ptr: Ptr) -> Result<&mut [u8]> {
        let block = self.validate(ptr)?;
        let memory = self.provider.memory_mut();
        let requested = block.header(memory).requested();

        Ok(&mut memory[ptr.offset()..ptr.offset() + requested])
    }

    /// The size that was passed to `allocate` / `resize` for this allocation
    pub fn requested_size(&self, ptr: Ptr) -> Result<usize> {
        let block = self.validate(ptr)?;

        Ok(block.header(self.provider.memory()).requested())
    }

    /* Getters */
    /// Whether the first region has been obtained
    pub fn is_initialized(&self) -> bool {
        self.start.is_some()
    }

    /// Bytes obtained from the provider so far
    pub fn committed(&self) -> usize {
        self.start.map_or(0, |start| self.provider.end() - start)
    }

    /// The underlying provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Free blocks in free-list order, i.e. by ascending size
    pub fn free_blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        FreeListIterator {
            memory: self.provider.memory(),
            head: self.free_list,
        }
    }

    /// Every block between the prologue and the epilogue, in address order
    pub fn blocks(&self) -> impl Iterator<Item = BlockInfo> + '_ {
        PhysicalBlocks {
            memory: self.provider.memory(),
            next: self.first_block(),
            end: self.provider.end(),
        }
    }

    /// Counts and sizes of the heap's blocks
    pub fn stats(&self) -> HeapStats {
        let mut stats = HeapStats {
            committed: self.committed(),
            regions: self.committed() / consts::REGION_SIZE,
            ..HeapStats::default()
        };

        for info in self.blocks() {
            if info.allocated {
                stats.allocated_blocks += 1;
                stats.allocated_bytes += info.size;
            } else {
                stats.free_blocks += 1;
                stats.free_bytes += info.size;
            }
        }

        stats
    }

    /// Walks the whole heap and the free list and verifies every structural invariant
    ///
    /// - sentinels are intact, every block has matching, correctly tagged header and footer
    /// - no two physically adjacent blocks are both free
    /// - block sizes add up to the committed memory minus the two sentinels
    /// - the free list is doubly linked, sorted by ascending size and holds exactly the blocks
    ///   whose allocated bit is clear
    pub fn check(&self) -> core::result::Result<(), Inconsistency> {
        let start = if let Some(start) = self.start {
            start
        } else {
            return Ok(());
        };
        let memory = self.provider.memory();
        let end = self.provider.end();

        let prologue = BoundaryTag::decode(util::read_word(memory, start));
        if prologue != BoundaryTag::header(0, 0, true) {
            return Err(Inconsistency::BadSentinel { offset: start });
        }

        let epilogue_at = end - consts::WORD_SIZE;
        let epilogue = BoundaryTag::decode(util::read_word(memory, epilogue_at));
        if epilogue != BoundaryTag::footer(0, 0, true) {
            return Err(Inconsistency::BadSentinel {
                offset: epilogue_at,
            });
        }

        // physical walk
        let mut spanned = 0;
        let mut free = Vec::new();
        let mut prev_free: Option<usize> = None;
        let mut payload = start + consts::TAG_OVERHEAD;
        while payload < end {
            let block = Block::from_payload(payload);
            let header = block.header(memory);

            if header.tag() != consts::HEADER_TAG {
                return Err(Inconsistency::CorruptTag { offset: payload });
            }

            let size = header.size();
            if size < consts::MIN_BLOCK_SIZE || size > end - payload {
                return Err(Inconsistency::BadSize {
                    offset: payload,
                    size,
                });
            }

            let footer = block.footer(memory);
            if footer.tag() != consts::FOOTER_TAG {
                return Err(Inconsistency::CorruptTag { offset: payload });
            }
            if footer.size() != size
                || footer.requested() != header.requested()
                || footer.is_allocated() != header.is_allocated()
            {
                return Err(Inconsistency::TagMismatch { offset: payload });
            }

            if header.is_allocated() {
                prev_free = None;
            } else {
                if let Some(first) = prev_free {
                    return Err(Inconsistency::Uncoalesced {
                        first,
                        second: payload,
                    });
                }
                prev_free = Some(payload);
                free.push(payload);
            }

            spanned += size;
            payload += size;
        }

        let expected = end - start - consts::SENTINEL_OVERHEAD;
        if spanned != expected {
            return Err(Inconsistency::SizeMismatch { spanned, expected });
        }

        // free-list walk; a cycle shows up as too many entries
        let mut listed = 0;
        let mut prev: Option<FreeBlock> = None;
        let mut cursor = self.free_list;
        while let Some(fb) = cursor {
            listed += 1;
            if listed > free.len() {
                break;
            }

            // `free` was filled in address order
            let offset = fb.offset().get();
            if free.binary_search(&offset).is_err() {
                return Err(Inconsistency::StrayEntry { offset });
            }
            if fb.prev_free(memory) != prev {
                return Err(Inconsistency::BrokenLink { offset });
            }
            if let Some(prev) = prev {
                if prev.block().size(memory) > fb.block().size(memory) {
                    return Err(Inconsistency::Unsorted { offset });
                }
            }

            prev = Some(fb);
            cursor = fb.next_free(memory);
        }

        if listed != free.len() {
            return Err(Inconsistency::FreeListMismatch {
                listed,
                free: free.len(),
            });
        }

        Ok(())
    }

    /* Private API */
    fn first_block(&self) -> Option<Block> {
        self.start
            .map(|start| Block::from_payload(start + consts::TAG_OVERHEAD))
    }

    /// Obtains the first region and lays out the prologue, one free block and the epilogue
    fn init(&mut self) -> Result<()> {
        if self.start.is_some() {
            return Ok(());
        }

        let start = if let Some(start) = self.provider.extend() {
            start
        } else {
            debug!("region provider refused the first region");
            return Err(HeapError::OutOfMemory);
        };
        debug_assert_eq!(start % consts::ALIGN_SIZE, 0);

        let memory = self.provider.memory_mut();

        util::write_word(memory, start, BoundaryTag::header(0, 0, true).encode());
        let fb = FreeBlock::from_parts(
            memory,
            start + consts::TAG_OVERHEAD,
            consts::REGION_SIZE - consts::SENTINEL_OVERHEAD,
        );
        block::write_footer(
            memory,
            start + consts::REGION_SIZE - consts::WORD_SIZE,
            BoundaryTag::footer(0, 0, true),
        );

        self.start = Some(start);
        self.free_list = Some(fb);

        debug!(start, "heap initialized");

        Ok(())
    }

    /// Grows the heap by one region; the new space is merged with a free block at the old end of
    /// the heap, if there's one
    fn extend(&mut self) -> Result<()> {
        let end = self.provider.end();
        let start = if let Some(start) = self.provider.extend() {
            start
        } else {
            debug!(committed = self.committed(), "region provider exhausted");
            return Err(HeapError::OutOfMemory);
        };
        debug_assert_eq!(start, end);

        let memory = self.provider.memory_mut();

        // the old epilogue becomes the header of the new block
        let fb = FreeBlock::from_parts(memory, start, consts::REGION_SIZE);
        block::write_footer(
            memory,
            start + consts::REGION_SIZE - consts::WORD_SIZE,
            BoundaryTag::footer(0, 0, true),
        );

        let merged = self.coalesce(fb.block());
        self.insert(merged);

        debug!(committed = self.committed(), "heap extended");

        Ok(())
    }

    /// Marks a validated, allocated block free, merges it and puts it back into the free list
    fn release(&mut self, block: Block) {
        let memory = self.provider.memory_mut();
        let size = block.size(memory);
        block.write(memory, size, 0, false);

        let fb = self.coalesce(block);
        self.insert(fb);
    }

    /// Merges an unlinked free block with its free neighbors
    ///
    /// Merged neighbors are removed from the free list; the result is *not* inserted.
    fn coalesce(&mut self, block: Block) -> FreeBlock {
        let memory = self.provider.memory();
        let size = block.size(memory);

        // the first block has no predecessor; its "previous footer" is the prologue
        let prev = if Some(block) == self.first_block() {
            None
        } else {
            Some(block.prev_neighbor(memory))
        };
        let prev = prev
            .filter(|prev| !prev.is_allocated(memory))
            .map(FreeBlock::assume_free);

        let next = Some(block.next_neighbor(memory))
            .filter(|next| !next.is_allocated(memory))
            .map(FreeBlock::assume_free);

        // NOTE unlink neighbors before their tags are rewritten; their links live in their payload
        match (prev, next) {
            (None, None) => FreeBlock::assume_free(block),
            (None, Some(next)) => {
                let total = size + next.size(memory);
                self.unlink(next);

                block.write(self.provider.memory_mut(), total, 0, false);
                FreeBlock::assume_free(block)
            }
            (Some(prev), None) => {
                let total = prev.size(memory) + size;
                self.unlink(prev);

                prev.block()
                    .write(self.provider.memory_mut(), total, 0, false);
                prev
            }
            (Some(prev), Some(next)) => {
                let total = prev.size(memory) + size + next.size(memory);
                self.unlink(prev);
                self.unlink(next);

                prev.block()
                    .write(self.provider.memory_mut(), total, 0, false);
                prev
            }
        }
    }

    /// Inserts `block` before the first member that is at least as big
    fn insert(&mut self, block: FreeBlock) {
        let memory = self.provider.memory_mut();
        let size = block.size(memory);

        let mut prev = None;
        let mut cursor = self.free_list;
        while let Some(fb) = cursor {
            if fb.size(memory) >= size {
                break;
            }

            prev = Some(fb);
            cursor = fb.next_free(memory);
        }

        block.set_prev_free(memory, prev);
        block.set_next_free(memory, cursor);

        if let Some(next) = cursor {
            next.set_prev_free(memory, Some(block));
        }

        if let Some(prev) = prev {
            prev.set_next_free(memory, Some(block));
        } else {
            self.free_list = Some(block);
        }
    }

    /// O(1) removal using the block's own links
    fn unlink(&mut self, block: FreeBlock) {
        let memory = self.provider.memory_mut();
        let prev = block.prev_free(memory);
        let next = block.next_free(memory);

        if let Some(prev) = prev {
            prev.set_next_free(memory, next);
        } else {
            // `block` was the smallest free block
            self.free_list = next;
        }

        if let Some(next) = next {
            next.set_prev_free(memory, prev);
        }

        block.set_next_free(memory, None);
        block.set_prev_free(memory, None);
    }

    /// First (and, the list being sorted, smallest) free block of at least `size` bytes
    fn search(&self, size: usize) -> Option<FreeBlock> {
        let memory = self.provider.memory();

        let mut cursor = self.free_list;
        while let Some(fb) = cursor {
            if fb.size(memory) >= size {
                return Some(fb);
            }

            cursor = fb.next_free(memory);
        }

        None
    }

    /// Checks that `ptr` names a live allocation without touching the heap
    fn validate(&self, ptr: Ptr) -> Result<Block> {
        let offset = ptr.offset();
        let start = if let Some(start) = self.start {
            start
        } else {
            return Err(reject(ptr, PointerFault::OutOfBounds));
        };
        let end = self.provider.end();

        if offset < start + consts::TAG_OVERHEAD || offset >= end - consts::WORD_SIZE {
            return Err(reject(ptr, PointerFault::OutOfBounds));
        }

        if (offset - start) % consts::ALIGN_SIZE != 0 {
            return Err(reject(ptr, PointerFault::Misaligned));
        }

        let memory = self.provider.memory();
        let block = Block::from_payload(offset);

        let header = block.header(memory);
        if header.tag() != consts::HEADER_TAG {
            return Err(reject(ptr, PointerFault::BadHeaderTag));
        }
        if !header.is_allocated() {
            return Err(reject(ptr, PointerFault::NotAllocated));
        }

        // the footer must lie before the epilogue
        if header.size() < consts::MIN_BLOCK_SIZE || header.size() > end - offset {
            return Err(reject(ptr, PointerFault::OutOfBounds));
        }

        let footer = block.footer(memory);
        if footer.tag() != consts::FOOTER_TAG {
            return Err(reject(ptr, PointerFault::BadFooterTag));
        }
        if !footer.is_allocated() {
            return Err(reject(ptr, PointerFault::NotAllocated));
        }
        if footer.size() != header.size() || footer.requested() != header.requested() {
            return Err(reject(ptr, PointerFault::TagMismatch));
        }

        // tags can be written into any payload; only a walk from the first block finds real ones
        if !self.is_block_boundary(offset) {
            return Err(reject(ptr, PointerFault::NotABlock));
        }

        Ok(block)
    }

    fn is_block_boundary(&self, offset: usize) -> bool {
        self.blocks()
            .map(|info| info.ptr.offset())
            .take_while(|&payload| payload <= offset)
            .any(|payload| payload == offset)
    }
}

fn reject(ptr: Ptr, fault: PointerFault) -> HeapError {
    warn!(offset = ptr.offset(), %fault, "rejected pointer");

    HeapError::InvalidPointer {
        offset: ptr.offset(),
        fault,
    }
}

struct FreeListIterator<'a> {
    memory: &'a [u8],
    head: Option<FreeBlock>,
}

impl Iterator for FreeListIterator<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let fb = self.head?;
        self.head = fb.next_free(self.memory);

        Some(BlockInfo::read(self.memory, fb.block()))
    }
}

struct PhysicalBlocks<'a> {
    memory: &'a [u8],
    next: Option<Block>,
    end: usize,
}

impl Iterator for PhysicalBlocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let block = self.next.filter(|block| block.payload() < self.end)?;
        let info = BlockInfo::read(self.memory, block);

        // stop on a corrupted size instead of looping or reading past the end
        self.next = if info.size == 0 {
            None
        } else {
            Some(block.next_neighbor(self.memory))
        };

        Some(info)
    }
}

struct FreeBlocks<'a, P>(&'a Heap<P>);

impl<P> fmt::Debug for FreeBlocks<'_, P>
where
    P: RegionProvider,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.0
                    .free_blocks()
                    .map(|info| (info.ptr.offset(), info.size)),
            )
            .finish()
    }
}

impl<P> fmt::Debug for Heap<P>
where
    P: RegionProvider,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("start", &self.start)
            .field("end", &self.provider.end())
            .field("free_blocks", &FreeBlocks(self))
            .finish()
    }
}
