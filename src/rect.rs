//! Partial window geometry
//!
//! The controller addresses columns in groups of 8 pixels, so horizontal
//! window bounds always start on a byte and end on the last pixel of a byte.

/// A rectangle
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Rect {
    /// Origin X
    pub x: u32,
    /// Origin Y
    pub y: u32,
    /// Width
    pub w: u32,
    /// Height
    pub h: u32,
}

impl Rect {
    /// Construct a new rectangle
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Rect {
        Rect { x, y, w, h }
    }

    /// First horizontal pixel, rounded down to a multiple of 8
    pub fn x_start(&self) -> u32 {
        self.x & !0x07
    }

    /// Last horizontal pixel, always the last bit of a byte
    pub fn x_end(&self) -> u32 {
        self.x_start().saturating_add(self.w).saturating_sub(1) | 0x07
    }

    /// Last vertical line
    pub fn y_end(&self) -> u32 {
        self.y.saturating_add(self.h).saturating_sub(1)
    }

    /// Number of data bytes covering the window, `w / 8 * h`
    pub fn byte_len(&self) -> u32 {
        (self.w / 8).saturating_mul(self.h)
    }

    /// Data bytes of the PARTIAL_WINDOW command
    ///
    /// Horizontal start/end, vertical start/end (each high byte first) and
    /// the gate scan flag (scan inside and outside of the window).
    pub(crate) fn partial_window_data(&self) -> [u8; 9] {
        let x_start = self.x_start();
        let x_end = self.x_end();
        let y_end = self.y_end();
        [
            (self.x >> 8) as u8,
            x_start as u8,
            (x_end >> 8) as u8,
            x_end as u8,
            (self.y >> 8) as u8,
            self.y as u8,
            (y_end >> 8) as u8,
            y_end as u8,
            0x01,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_byte_aligned() {
        for x in 0..400 {
            for w in [1, 7, 8, 9, 64, 123] {
                let data = Rect::new(x, 0, w, 1).partial_window_data();
                assert_eq!(data[1], (x & 0xf8) as u8);
                assert_eq!(data[3] & 0x07, 0x07);
            }
        }
    }

    #[test]
    fn full_width_window() {
        let data = Rect::new(0, 0, 400, 300).partial_window_data();
        assert_eq!(data, [0x00, 0x00, 0x01, 0x8F, 0x00, 0x00, 0x01, 0x2B, 0x01]);
    }

    #[test]
    fn unaligned_window() {
        // x = 13 starts at 8, 8 + 20 - 1 = 27 = 0b11011 -> 31
        let rect = Rect::new(13, 260, 20, 10);
        assert_eq!(rect.x_start(), 8);
        assert_eq!(rect.x_end(), 31);
        assert_eq!(
            rect.partial_window_data(),
            [0x00, 0x08, 0x00, 0x1F, 0x01, 0x04, 0x01, 0x0D, 0x01]
        );
    }

    #[test]
    fn window_right_of_column_255() {
        // the high bit of x must survive the alignment
        let rect = Rect::new(300, 0, 16, 1);
        assert_eq!(rect.x_start(), 296);
        assert_eq!(rect.x_end(), 311);
        let data = rect.partial_window_data();
        assert_eq!(&data[..4], &[0x01, 0x28, 0x01, 0x37]);
    }

    #[test]
    fn byte_len() {
        assert_eq!(Rect::new(0, 0, 400, 300).byte_len(), 15000);
        assert_eq!(Rect::new(16, 16, 32, 4).byte_len(), 16);
    }

    #[test]
    fn oversized_window_saturates() {
        let rect = Rect::new(u32::MAX - 3, u32::MAX - 1, u32::MAX, u32::MAX);
        assert_eq!(rect.x_end(), u32::MAX);
        assert_eq!(rect.y_end(), u32::MAX - 1);
        assert_eq!(rect.byte_len(), u32::MAX);
        // never panics, the bytes are truncated like any other window
        let data = rect.partial_window_data();
        assert_eq!(data[8], 0x01);
    }
}
