//! A Driver for the Waveshare 4.2" E-Ink Display via SPI
//!
//! This driver was built using [`embedded-hal`] traits. Besides the usual full
//! and quick refreshes it can keep quick refreshes healthy by driving the
//! white-to-white and black-to-black transitions every few updates, and render
//! 8 bit gray images in several passes.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/1.0
//!
//! # Requirements
//!
//! ### SPI
//!
//! - MISO is not connected/available
//! - SPI_MODE_0 is used (CPHL = 0, CPOL = 0)
//! - 8 bits per word, MSB first
//! - Max. Speed tested by myself was 8Mhz but more should be possible (Ben Krasnow used 18Mhz with his implemenation)
//!
//! ### Other....
//!
//! - Buffersize: Wherever a buffer is used it always needs to be of the size: `width / 8 * length`,
//!   where width and length being either the full e-ink size or the partial update window size
//! - Gray images for the shade renderer use one byte per pixel, see [`graphics::GrayDisplay`]
//!
//! # Examples
//!
//! ```ignore
//! use epd4in2_shades::{epd4in2::*, graphics::DisplayRotation, prelude::*};
//!
//! let mut epd = Epd4in2::new(&mut spi, busy, dc, rst, delay, Config::default())?;
//!
//! let mut display = Display4in2::default();
//! display.set_rotation(DisplayRotation::Rotate90);
//!
//! // draw something into the buffer with embedded-graphics
//!
//! epd.update_and_display_frame(&mut spi, Some(display.buffer()))?;
//!
//! // wait and look at the image
//!
//! epd.clear_frame(&mut spi)?;
//! epd.display_frame(&mut spi)?;
//!
//! epd.sleep(&mut spi)?;
//! ```
//!
#![no_std]

#[cfg(feature = "graphics")]
pub mod graphics;

mod traits;

pub mod color;

pub mod error;

pub mod rect;

/// Interface for the physical connection between display and the controlling device
mod interface;

pub mod epd4in2;

pub mod prelude {
    pub use crate::color::Color;
    pub use crate::epd4in2::{Config, RefreshLut, SpeedCoefficients, TransmissionChannel};
    pub use crate::error::ErrorKind;
    pub use crate::SPI_MODE;

    #[cfg(feature = "graphics")]
    pub use crate::graphics::{Display, DisplayRotation, GrayDisplay};
}

use embedded_hal::spi::{Mode, Phase, Polarity};

/// SPI mode -
/// For more infos see [Requirements: SPI](index.html#spi)
pub const SPI_MODE: Mode = Mode {
    phase: Phase::CaptureOnFirstTransition,
    polarity: Polarity::IdleLow,
};

/// Computes the needed buffer length. Takes care of rounding up in case width
/// is not divisible by 8.
///
///  unused
///  bits        width
/// <----><------------------------>
/// \[XXXXX210\]\[76543210\]...\[76543210\] ^
/// \[XXXXX210\]\[76543210\]...\[76543210\] | height
/// \[XXXXX210\]\[76543210\]...\[76543210\] v
pub const fn buffer_len(width: usize, height: usize) -> usize {
    (width + 7) / 8 * height
}
