/// Size of one boundary tag (header or footer) in bytes
pub const WORD_SIZE: usize = 8;

// Header before the payload plus footer after it
pub const TAG_OVERHEAD: usize = 2 * WORD_SIZE;

pub const ALIGN_SIZE_LOG2: u32 = 4;
/// All block sizes are multiple of this number; this number is also the alignment of every payload
/// offset handed out by the allocator
pub const ALIGN_SIZE: usize = 1 << ALIGN_SIZE_LOG2;

/// Smallest legal block: both tags plus room for the two free-list links
pub const MIN_BLOCK_SIZE: usize = 32;

/// Number of bytes the heap grows by every time it asks its provider for memory
pub const REGION_SIZE: usize = 4096;

/// Adjusted requests of this many bytes (or more) are rejected without touching the heap
pub const MAX_BLOCK_SIZE: usize = 5 * REGION_SIZE;

/// Region cap used by `Arena::default`
pub const DEFAULT_MAX_REGIONS: usize = 256;

// Prologue header at the start of the heap plus epilogue footer at its end
pub const SENTINEL_OVERHEAD: usize = 2 * WORD_SIZE;

// Tag values stored in the top 16 bits of every header / footer word
pub const HEADER_TAG: u16 = 0x48dc;
pub const FOOTER_TAG: u16 = 0xf0e7;

#[allow(dead_code)]
const ASSERT0: [(); 0 - !(MIN_BLOCK_SIZE % ALIGN_SIZE == 0) as usize] = [];

// NOTE free blocks keep `next` and `prev` in their payload so the minimum block must fit both tags
// and both links
#[allow(dead_code)]
const ASSERT1: [(); 0 - !(MIN_BLOCK_SIZE >= TAG_OVERHEAD + 2 * WORD_SIZE) as usize] = [];

#[allow(dead_code)]
const ASSERT2: [(); 0 - !(REGION_SIZE % ALIGN_SIZE == 0) as usize] = [];
