use crate::{consts, util};

/// Decoded form of one header or footer word
///
/// Layout of the 64-bit word, from the least significant bit:
///
/// - `0..32`: block size; bit 0 is the allocated flag (sizes are multiples of `ALIGN_SIZE`)
/// - `32..48`: size originally requested by the user, `0` while the block is free
/// - `48..64`: header or footer tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryTag {
    size: usize,
    requested: usize,
    allocated: bool,
    tag: u16,
}

impl BoundaryTag {
    const ALLOC_BIT: u64 = 1 << 0;
    const FLAG_BITS: u64 = (1 << consts::ALIGN_SIZE_LOG2) - 1;
    const SIZE_MASK: u64 = 0xffff_ffff;
    const REQUESTED_SHIFT: u32 = 32;
    const REQUESTED_MASK: u64 = 0xffff;
    const TAG_SHIFT: u32 = 48;

    /* Constructors */
    pub fn header(size: usize, requested: usize, allocated: bool) -> Self {
        BoundaryTag::new(size, requested, allocated, consts::HEADER_TAG)
    }

    pub fn footer(size: usize, requested: usize, allocated: bool) -> Self {
        BoundaryTag::new(size, requested, allocated, consts::FOOTER_TAG)
    }

    fn new(size: usize, requested: usize, allocated: bool, tag: u16) -> Self {
        debug_assert_eq!(size % consts::ALIGN_SIZE, 0);
        debug_assert!(size as u64 <= Self::SIZE_MASK);
        debug_assert!(requested as u64 <= Self::REQUESTED_MASK);

        BoundaryTag {
            size,
            requested,
            allocated,
            tag,
        }
    }

    pub fn decode(word: u64) -> Self {
        let raw_size = word & Self::SIZE_MASK;

        BoundaryTag {
            size: (raw_size & !Self::FLAG_BITS) as usize,
            requested: ((word >> Self::REQUESTED_SHIFT) & Self::REQUESTED_MASK) as usize,
            allocated: raw_size & Self::ALLOC_BIT != 0,
            tag: (word >> Self::TAG_SHIFT) as u16,
        }
    }

    pub fn encode(&self) -> u64 {
        let mut size = self.size as u64 & Self::SIZE_MASK;
        if self.allocated {
            size |= Self::ALLOC_BIT;
        }

        size | (self.requested as u64 & Self::REQUESTED_MASK) << Self::REQUESTED_SHIFT
            | u64::from(self.tag) << Self::TAG_SHIFT
    }

    /* Getters */
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn tag(&self) -> u16 {
        self.tag
    }
}

/// A block, identified by the offset of its payload
///
/// Every method takes the heap bytes explicitly; a `Block` is only a position and never borrows
/// the heap, so the same bytes can be read as tags, links or user data at different times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    payload: usize,
}

impl Block {
    /* Constructors */
    pub fn from_payload(payload: usize) -> Self {
        debug_assert!(payload >= consts::WORD_SIZE);

        Block { payload }
    }

    /* Getters */
    pub fn payload(self) -> usize {
        self.payload
    }

    pub fn header_offset(self) -> usize {
        self.payload - consts::WORD_SIZE
    }

    pub fn header(self, memory: &[u8]) -> BoundaryTag {
        BoundaryTag::decode(util::read_word(memory, self.header_offset()))
    }

    pub fn size(self, memory: &[u8]) -> usize {
        self.header(memory).size()
    }

    pub fn is_allocated(self, memory: &[u8]) -> bool {
        self.header(memory).is_allocated()
    }

    // NOTE(safety) the size is taken from the header; callers that don't trust the header must
    // bounds check the result before reading the footer
    pub fn footer_offset(self, memory: &[u8]) -> usize {
        self.payload + self.size(memory) - consts::TAG_OVERHEAD
    }

    pub fn footer(self, memory: &[u8]) -> BoundaryTag {
        BoundaryTag::decode(util::read_word(memory, self.footer_offset(memory)))
    }

    /* Neighbors */
    pub fn next_neighbor(self, memory: &[u8]) -> Block {
        Block::from_payload(self.payload + self.size(memory))
    }

    // NOTE this reads the footer right before our header; at the start of the heap that word is
    // the prologue, which has size 0, so the "neighbor" is this very block
    pub fn prev_neighbor(self, memory: &[u8]) -> Block {
        let prev_footer = self.payload - consts::TAG_OVERHEAD;
        let size = BoundaryTag::decode(util::read_word(memory, prev_footer)).size();

        Block::from_payload(self.payload - size)
    }

    /* Setters */
    pub fn set_header(self, memory: &mut [u8], size: usize, requested: usize, allocated: bool) {
        let tag = BoundaryTag::header(size, requested, allocated);
        util::write_word(memory, self.header_offset(), tag.encode());
    }

    /// Writes the footer where the *current* header says it goes
    pub fn set_footer(self, memory: &mut [u8], size: usize, requested: usize, allocated: bool) {
        let at = self.footer_offset(memory);
        write_footer(memory, at, BoundaryTag::footer(size, requested, allocated));
    }

    /// Writes both tags
    pub fn write(self, memory: &mut [u8], size: usize, requested: usize, allocated: bool) {
        debug_assert!(size >= consts::MIN_BLOCK_SIZE);

        self.set_header(memory, size, requested, allocated);
        self.set_footer(memory, size, requested, allocated);
    }
}

pub fn write_footer(memory: &mut [u8], at: usize, tag: BoundaryTag) {
    debug_assert_eq!(tag.tag(), consts::FOOTER_TAG);

    util::write_word(memory, at, tag.encode());
}
