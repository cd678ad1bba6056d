use core::{fmt, num::NonZeroUsize};

use crate::{block::Block, consts, util};

/// A block that is known (by its allocated bit) to be free
///
/// Free blocks reuse the first two words of their payload as the `next` and `prev` free-list
/// links. The links hold payload offsets; `0` encodes "none" because offset `0` is always the
/// prologue and can never be a free block.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
    block: Block,
}

impl FreeBlock {
    const NEXT: usize = 0;
    const PREV: usize = consts::WORD_SIZE;

    /* Constructors */
    pub fn assume_free(block: Block) -> Self {
        FreeBlock { block }
    }

    pub fn from_offset(offset: NonZeroUsize) -> Self {
        FreeBlock::assume_free(Block::from_payload(offset.get()))
    }

    /// Writes both tags of a free block and clears its links
    pub fn from_parts(memory: &mut [u8], payload: usize, size: usize) -> Self {
        let block = Block::from_payload(payload);
        block.write(memory, size, 0, false);

        let fb = FreeBlock::assume_free(block);
        fb.set_next_free(memory, None);
        fb.set_prev_free(memory, None);
        fb
    }

    /* Getters */
    pub fn block(self) -> Block {
        self.block
    }

    pub fn offset(self) -> NonZeroUsize {
        NonZeroUsize::new(self.block.payload()).unwrap_or_else(|| unreachable!())
    }

    pub fn size(self, memory: &[u8]) -> usize {
        debug_assert!(!self.block.is_allocated(memory));

        self.block.size(memory)
    }

    pub fn next_free(self, memory: &[u8]) -> Option<FreeBlock> {
        self.link(memory, Self::NEXT)
    }

    pub fn prev_free(self, memory: &[u8]) -> Option<FreeBlock> {
        self.link(memory, Self::PREV)
    }

    /* Setters */
    pub fn set_next_free(self, memory: &mut [u8], next: Option<FreeBlock>) {
        self.set_link(memory, Self::NEXT, next)
    }

    pub fn set_prev_free(self, memory: &mut [u8], prev: Option<FreeBlock>) {
        self.set_link(memory, Self::PREV, prev)
    }

    fn link(self, memory: &[u8], field: usize) -> Option<FreeBlock> {
        let word = util::read_word(memory, self.block.payload() + field);
        NonZeroUsize::new(word as usize).map(FreeBlock::from_offset)
    }

    fn set_link(self, memory: &mut [u8], field: usize, link: Option<FreeBlock>) {
        let word = link.map(|fb| fb.offset().get() as u64).unwrap_or(0);
        util::write_word(memory, self.block.payload() + field, word);
    }
}

impl fmt::Debug for FreeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FreeBlock").field(&self.block.payload()).finish()
    }
}
