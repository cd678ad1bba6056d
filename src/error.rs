use thiserror::Error;

/// The two ways a heap operation can fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Zero-size request or a pointer that doesn't name a live allocation
    InvalidArgument,
    /// The request can't be satisfied with the memory the provider is willing to give
    OutOfMemory,
}

/// Why a pointer handed to `free` / `resize` was rejected
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PointerFault {
    /// The pointer or its block lies outside the committed heap
    #[error("outside of the heap")]
    OutOfBounds,
    /// Payload offsets are always multiples of the block alignment
    #[error("not aligned to a block boundary")]
    Misaligned,
    /// The header word doesn't carry the header tag
    #[error("bad header tag")]
    BadHeaderTag,
    /// The footer word doesn't carry the footer tag
    #[error("bad footer tag")]
    BadFooterTag,
    /// The block is free (double free, or never allocated)
    #[error("block is not allocated")]
    NotAllocated,
    /// Header and footer disagree on block size or requested size
    #[error("header and footer disagree")]
    TagMismatch,
    /// Well-formed tags that don't sit on a block boundary, e.g. inside another payload
    #[error("not the start of a block")]
    NotABlock,
}

/// Error returned by the public heap operations
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    /// `allocate(0)`
    #[error("zero-size allocation request")]
    ZeroSize,
    /// The pointer doesn't name a live allocation
    #[error("invalid pointer {offset:#x}: {fault}")]
    InvalidPointer {
        /// Offset carried by the rejected pointer
        offset: usize,
        /// What the validation found
        fault: PointerFault,
    },
    /// The adjusted request reaches the hard allocation ceiling
    #[error("request needs a {need}-byte block; blocks must be smaller than {limit} bytes")]
    TooLarge {
        /// Adjusted block size, `usize::MAX` if the adjustment overflowed
        need: usize,
        /// The ceiling
        limit: usize,
    },
    /// The region provider refused to grow the heap
    #[error("out of memory: the region provider is exhausted")]
    OutOfMemory,
}

impl HeapError {
    /// Coarse classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            HeapError::ZeroSize | HeapError::InvalidPointer { .. } => ErrorKind::InvalidArgument,
            HeapError::TooLarge { .. } | HeapError::OutOfMemory => ErrorKind::OutOfMemory,
        }
    }
}

/// A violated heap invariant, reported by `Heap::check`
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Inconsistency {
    /// A block's header or footer carries the wrong tag
    #[error("block at {offset:#x} has a corrupted tag")]
    CorruptTag {
        /// Payload offset of the block
        offset: usize,
    },
    /// A block's header and footer disagree
    #[error("block at {offset:#x}: header and footer disagree")]
    TagMismatch {
        /// Payload offset of the block
        offset: usize,
    },
    /// A block is too small, misaligned or runs past the epilogue
    #[error("block at {offset:#x} has an invalid size of {size} bytes")]
    BadSize {
        /// Payload offset of the block
        offset: usize,
        /// Size found in the header
        size: usize,
    },
    /// Two physically adjacent blocks are both free
    #[error("free blocks at {first:#x} and {second:#x} were not coalesced")]
    Uncoalesced {
        /// Payload offset of the first block
        first: usize,
        /// Payload offset of the second block
        second: usize,
    },
    /// The free list isn't sorted by ascending size
    #[error("free list out of order at {offset:#x}")]
    Unsorted {
        /// Payload offset of the first out-of-order block
        offset: usize,
    },
    /// A free-list link doesn't point back to its neighbor
    #[error("broken free-list link at {offset:#x}")]
    BrokenLink {
        /// Payload offset of the block with the bad link
        offset: usize,
    },
    /// The free list and the free bits describe different sets of blocks
    #[error("free list holds {listed} blocks but the heap has {free} free blocks")]
    FreeListMismatch {
        /// Number of blocks reachable from the free-list head
        listed: usize,
        /// Number of blocks with a clear allocated bit
        free: usize,
    },
    /// A free-list entry that isn't one of the heap's free blocks
    #[error("free list points at {offset:#x}, which is not a free block")]
    StrayEntry {
        /// Offset stored in the free list
        offset: usize,
    },
    /// Block sizes don't add up to the committed memory
    #[error("blocks span {spanned} bytes but {expected} bytes are committed to blocks")]
    SizeMismatch {
        /// Sum of all block sizes
        spanned: usize,
        /// Committed bytes minus the prologue and epilogue
        expected: usize,
    },
    /// The prologue or epilogue marker was overwritten
    #[error("heap sentinel at {offset:#x} was overwritten")]
    BadSentinel {
        /// Offset of the sentinel word
        offset: usize,
    },
}

/// Result of the public heap operations
pub type Result<T> = core::result::Result<T, HeapError>;
