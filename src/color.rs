//! B/W Color for the 4.2" EPD

#[cfg(feature = "graphics")]
use embedded_graphics_core::pixelcolor::{raw::RawU1, BinaryColor, PixelColor};

/// Only for the B/W Displays atm
///
/// On this panel a set bit is a white pixel and a cleared bit a black one.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Color {
    /// Black color
    Black,
    /// White color
    #[default]
    White,
}

impl Color {
    /// Get the color encoding of the color for one bit
    pub fn get_bit_value(self) -> u8 {
        match self {
            Color::White => 1u8,
            Color::Black => 0u8,
        }
    }

    /// Gets a full byte of black or white pixels
    pub fn get_byte_value(self) -> u8 {
        match self {
            Color::White => 0xff,
            Color::Black => 0x00,
        }
    }
}

#[cfg(feature = "graphics")]
impl PixelColor for Color {
    type Raw = RawU1;
}

#[cfg(feature = "graphics")]
impl From<BinaryColor> for Color {
    fn from(b: BinaryColor) -> Color {
        match b {
            BinaryColor::On => Color::Black,
            BinaryColor::Off => Color::White,
        }
    }
}

#[cfg(feature = "graphics")]
impl From<RawU1> for Color {
    fn from(b: RawU1) -> Self {
        use embedded_graphics_core::prelude::RawData;
        if b.into_inner() == 0 {
            Color::Black
        } else {
            Color::White
        }
    }
}

#[cfg(feature = "graphics")]
impl From<Color> for RawU1 {
    fn from(color: Color) -> Self {
        RawU1::new(color.get_bit_value())
    }
}
