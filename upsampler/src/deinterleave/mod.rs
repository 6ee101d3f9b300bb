//! Recovery of parallel serial lines from packed capture words.
//!
//! The capture state machine samples all [`LINES`] data pins on every bit clock
//! and shifts the group left into a 32-bit register, pushing a word every 8
//! cycles. Within one word, bit `k` of line `l`'s byte (bit 7 is the oldest
//! cycle, so bytes are MSB first) sits at bit `4 * k + l`:
//!
//! ```text
//! word bit   31  30  29  28  27 ...  3   2   1   0
//! line/bit   3.7 2.7 1.7 0.7 3.6 ... 3.0 2.0 1.0 0.0
//! ```
//!
//! [`deinterleave4`] gathers each line into its own byte, line `l` in byte `l`.
//! A frame is [`WORDS_PER_FRAME`] words: the left slot's 32 bits in words 0..4
//! and the right slot's in words 4..8.

mod expand_table;

#[cfg(test)]
mod tests;

pub use expand_table::EXPAND;

/// Capture data lines sampled together.
pub const LINES: usize = 4;
/// Slots per line and frame (left, right).
pub const SLOTS: usize = 2;
/// Capture words carrying one 32-bit slot of every line.
pub const WORDS_PER_SLOT: usize = 4;
pub const WORDS_PER_FRAME: usize = SLOTS * WORDS_PER_SLOT;

#[inline(always)]
fn spread16(half: u32) -> u32 {
    EXPAND[(half & 0xff) as usize] | EXPAND[((half >> 8) & 0xff) as usize] << 16
}

/// Perfect shuffle of the two 16-bit halves: bit `i` of the low half moves to
/// `2 * i` and bit `i` of the high half to `2 * i + 1`.
///
/// Seen on the 5-bit bit index this is a rotation left by one.
#[inline(always)]
pub fn shuffle(word: u32) -> u32 {
    spread16(word & 0xffff) | spread16(word >> 16) << 1
}

/// Moves bit `4 * k + l` to bit `8 * l + k`.
#[inline(always)]
pub fn deinterleave4(word: u32) -> u32 {
    shuffle(shuffle(shuffle(word)))
}

/// Packs one byte per line the way the capture state machine does.
pub fn interleave4(bytes: [u8; LINES]) -> u32 {
    let mut word = 0;
    for (line, byte) in bytes.into_iter().enumerate() {
        for bit in 0..8 {
            word |= ((byte as u32 >> bit) & 1) << (4 * bit + line);
        }
    }
    word
}

/// Slot samples of every line from one captured frame, indexed `[line][slot]`.
#[inline(always)]
pub fn frame_samples(frame: &[u32; WORDS_PER_FRAME]) -> [[i32; SLOTS]; LINES] {
    let mut samples = [[0; SLOTS]; LINES];

    for (slot, words) in frame.chunks_exact(WORDS_PER_SLOT).enumerate() {
        let mut packed = [0u32; LINES];
        for &word in words {
            let bytes = deinterleave4(word).to_le_bytes();
            for (sample, byte) in packed.iter_mut().zip(bytes) {
                *sample = *sample << 8 | byte as u32;
            }
        }
        for (line, sample) in packed.into_iter().enumerate() {
            samples[line][slot] = sample as i32;
        }
    }

    samples
}

/// Capture words for one frame holding `samples[line][slot]`. Inverse of
/// [`frame_samples`].
pub fn frame_words(samples: &[[i32; SLOTS]; LINES]) -> [u32; WORDS_PER_FRAME] {
    let mut frame = [0; WORDS_PER_FRAME];

    for (index, word) in frame.iter_mut().enumerate() {
        let slot = index / WORDS_PER_SLOT;
        let shift = 8 * (WORDS_PER_SLOT - 1 - index % WORDS_PER_SLOT);
        let bytes = samples.map(|line| (line[slot] as u32 >> shift) as u8);
        *word = interleave4(bytes);
    }

    frame
}
