use core::ops::{Add, Rem, Sub};

use crate::consts;

pub fn round_up<T>(x: T, multiple: T, zero: T) -> (/* x */ T, /* rem */ T)
where
    T: Add<T, Output = T> + Copy + Rem<T, Output = T> + PartialEq + Sub<T, Output = T>,
{
    let rem = x % multiple;
    if rem == zero {
        (x, zero)
    } else {
        (x + (multiple - rem), rem)
    }
}

/// Maps a user request to the size of the block that will hold it
///
/// Returns `None` if the computation overflows, which callers treat like any other oversized
/// request
pub fn adjusted_size(requested: usize) -> Option<usize> {
    let size = requested.checked_add(consts::TAG_OVERHEAD)?;
    let size = size.max(consts::MIN_BLOCK_SIZE);

    if size > usize::MAX - consts::ALIGN_SIZE {
        return None;
    }

    Some(round_up(size, consts::ALIGN_SIZE, 0).0)
}

pub fn read_word(memory: &[u8], at: usize) -> u64 {
    let mut bytes = [0; consts::WORD_SIZE];
    bytes.copy_from_slice(&memory[at..at + consts::WORD_SIZE]);
    u64::from_ne_bytes(bytes)
}

pub fn write_word(memory: &mut [u8], at: usize, word: u64) {
    memory[at..at + consts::WORD_SIZE].copy_from_slice(&word.to_ne_bytes());
}
