use pretty_assertions::assert_eq;
use rand::{RngExt, SeedableRng, rngs::StdRng};

use super::*;

#[test]
fn expand_spreads_bits_to_even_positions() {
    for byte in 0..=255u32 {
        let expanded = EXPAND[byte as usize];
        for bit in 0..8 {
            assert_eq!(
                expanded >> (2 * bit) & 1,
                byte >> bit & 1,
                "byte {:#04x} bit {}",
                byte,
                bit
            );
        }
        assert_eq!(expanded & 0xaaaa_aaaa, 0, "odd bits set for {:#04x}", byte);
    }
}

#[test]
fn expand_is_a_bijection() {
    let mut seen = EXPAND.to_vec();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 256);
    assert_eq!(EXPAND[0xff], 0x5555);
    assert_eq!(EXPAND[0xa5], 0x4411);
}

#[test]
fn packing_matches_worked_example() {
    assert_eq!(interleave4([0xa5, 0x3c, 0x0f, 0x81]), 0x9032_674d);
    assert_eq!(deinterleave4(0x9032_674d), 0x810f_3ca5);
}

#[test]
fn single_line_lands_in_its_byte() {
    assert_eq!(interleave4([0xff, 0, 0, 0]), 0x1111_1111);
    assert_eq!(deinterleave4(0x1111_1111), 0x0000_00ff);
    assert_eq!(deinterleave4(0x8888_8888), 0xff00_0000);
}

#[test]
fn deinterleave_known_word() {
    assert_eq!(deinterleave4(0x1234_5678), 0x011e_66aa);
}

#[test]
fn shuffle_rotates_bit_index() {
    for bit in 0..32 {
        let rotated = ((bit << 1) | (bit >> 4)) & 31;
        assert_eq!(shuffle(1 << bit), 1 << rotated, "bit {}", bit);
    }
}

#[test]
fn deinterleave_inverts_packing() {
    let mut rng = StdRng::from_seed([3; 32]);

    for _ in 0..1000 {
        let bytes = [
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
        ];
        assert_eq!(deinterleave4(interleave4(bytes)), u32::from_le_bytes(bytes));
    }
}

#[test]
fn frame_samples_reassembles_slots() {
    let samples = [
        [0x1234_5678, -1],
        [0, i32::MIN],
        [-256, 0x7fff_ffff],
        [0x0102_0304, -0x0102_0304],
    ];
    let frame = frame_words(&samples);

    assert_eq!(frame_samples(&frame), samples);
}

#[test]
fn left_slot_occupies_first_four_words() {
    let frame = frame_words(&[[-1, 0], [0, 0], [0, 0], [0, 0]]);

    assert_eq!(frame, [0x1111_1111, 0x1111_1111, 0x1111_1111, 0x1111_1111, 0, 0, 0, 0]);
}

#[test]
fn most_significant_byte_comes_first() {
    let mut frame = [0; WORDS_PER_FRAME];
    frame[0] = interleave4([0x80, 0, 0, 0]);
    frame[7] = interleave4([0, 0, 0, 0x01]);

    let samples = frame_samples(&frame);
    assert_eq!(samples[0][0], i32::MIN);
    assert_eq!(samples[3][1], 1);
}
