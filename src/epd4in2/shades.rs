//! Thresholding of 8 bit gray images into the 1 bit passes of the shade renderer

use super::constants::SHADES;
use bit_field::BitField;

/// Gray threshold of a renderer pass, `255 - 255 * (pass + 1) / SHADES`
pub fn threshold(pass: u8) -> u8 {
    let step = 255 * (u16::from(pass) + 1) / u16::from(SHADES);
    255u8.saturating_sub(u8::try_from(step).unwrap_or(u8::MAX))
}

/// Packs 8 gray samples into one byte, the first sample goes into the MSB.
///
/// A bit is set (white) if its sample is below `threshold`.
pub fn pack_byte(samples: &[u8], threshold: u8) -> u8 {
    debug_assert_eq!(samples.len(), 8);
    let mut byte = 0u8;
    for (i, &sample) in samples.iter().take(8).enumerate() {
        byte.set_bit(7 - i, sample < threshold);
    }
    byte
}

/// Packs `samples` into `out`, 8 samples per byte.
///
/// Returns the number of bytes written.
pub(crate) fn pack_into(samples: &[u8], threshold: u8, out: &mut [u8]) -> usize {
    let mut written = 0;
    for (byte, group) in out.iter_mut().zip(samples.chunks_exact(8)) {
        *byte = pack_byte(group, threshold);
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    // small xorshift so the sample grids differ between runs of the loop
    fn next(seed: &mut u32) -> u8 {
        *seed ^= *seed << 13;
        *seed ^= *seed >> 17;
        *seed ^= *seed << 5;
        (*seed >> 24) as u8
    }

    #[test]
    fn thresholds() {
        assert_eq!(threshold(0), 224);
        assert_eq!(threshold(1), 192);
        assert_eq!(threshold(6), 32);
        for pass in 1..SHADES - 1 {
            assert!(threshold(pass) < threshold(pass - 1));
        }
    }

    #[test]
    fn msb_is_first_sample() {
        assert_eq!(pack_byte(&[0, 255, 255, 255, 255, 255, 255, 255], 128), 0x80);
        assert_eq!(pack_byte(&[255, 255, 255, 255, 255, 255, 255, 0], 128), 0x01);
        assert_eq!(pack_byte(&[0; 8], 1), 0xFF);
        assert_eq!(pack_byte(&[0; 8], 0), 0x00);
        assert_eq!(pack_byte(&[10, 20, 30, 40, 50, 60, 70, 80], 45), 0b1111_0000);
    }

    #[test]
    fn matches_bitwise_reference() {
        let mut seed = 0x1234_5678;
        for _ in 0..2000 {
            let mut samples = [0u8; 8];
            for s in samples.iter_mut() {
                *s = next(&mut seed);
            }
            let t = next(&mut seed);
            let packed = pack_byte(&samples, t);
            for (i, &sample) in samples.iter().enumerate() {
                let bit = (packed >> (7 - i)) & 1;
                assert_eq!(bit == 1, sample < t);
            }
        }
    }

    #[test]
    fn pack_into_groups_of_eight() {
        let samples = [0u8, 0, 0, 0, 0, 0, 0, 0, 255, 255, 255, 255, 255, 255, 255, 255];
        let mut out = [0xAAu8; 4];
        assert_eq!(pack_into(&samples, 100, &mut out), 2);
        assert_eq!(out, [0xFF, 0x00, 0xAA, 0xAA]);
    }
}
