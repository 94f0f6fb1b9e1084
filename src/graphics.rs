//! Graphics Support for EPDs

use crate::color::Color;
use embedded_graphics_core::pixelcolor::{Gray8, GrayColor};
use embedded_graphics_core::prelude::*;

/// Display rotation, only 90° increments supported
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate by 90 degrees clockwise
    Rotate90,
    /// Rotate by 180 degrees clockwise
    Rotate180,
    /// Rotate 270 degrees clockwise
    Rotate270,
}

/// count the number of bytes per line knowing that it may contains padding bits
const fn line_bytes(width: u32) -> usize {
    // round to upper 8 bit count
    (width as usize + 7) / 8
}

/// Maps a point of the rotated drawing surface onto the unrotated panel.
///
/// Returns `None` for points outside of the panel.
fn panel_coordinates(
    point: Point,
    width: u32,
    height: u32,
    rotation: DisplayRotation,
) -> Option<(u32, u32)> {
    // as i32 = never use more than 2 billion pixel per line or per column
    let (x, y) = match rotation {
        DisplayRotation::Rotate0 => (point.x, point.y),
        DisplayRotation::Rotate90 => (width as i32 - 1 - point.y, point.x),
        DisplayRotation::Rotate180 => (width as i32 - 1 - point.x, height as i32 - 1 - point.y),
        DisplayRotation::Rotate270 => (point.y, height as i32 - 1 - point.x),
    };

    if x < 0 || x >= width as i32 || y < 0 || y >= height as i32 {
        return None;
    }
    Some((x as u32, y as u32))
}

fn rotated_size(width: u32, height: u32, rotation: DisplayRotation) -> Size {
    match rotation {
        DisplayRotation::Rotate0 | DisplayRotation::Rotate180 => Size::new(width, height),
        DisplayRotation::Rotate90 | DisplayRotation::Rotate270 => Size::new(height, width),
    }
}

/// Black/white display buffer used for drawing with embedded graphics
///
/// The buffer can be sent as is with
/// [`update_and_display_frame`](crate::epd4in2::Epd4in2::update_and_display_frame)
/// or [`update_partial_frame`](crate::epd4in2::Epd4in2::update_partial_frame).
///
/// - WIDTH: width in pixel when display is not rotated
/// - HEIGHT: height in pixel when display is not rotated
/// - BYTECOUNT: This is redundant with prvious data and should be removed when const generic
///              expressions are stabilized, use [`buffer_len`](crate::buffer_len)
pub struct Display<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> {
    buffer: [u8; BYTECOUNT],
    rotation: DisplayRotation,
}

impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> Default
    for Display<WIDTH, HEIGHT, BYTECOUNT>
{
    /// Initialize display with white pixels
    // inline is necessary here to allow heap allocation via Box on stack limited programs
    #[inline(always)]
    fn default() -> Self {
        Self {
            buffer: [Color::White.get_byte_value(); BYTECOUNT],
            rotation: DisplayRotation::default(),
        }
    }
}

/// For use with embedded_grahics
impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> DrawTarget
    for Display<WIDTH, HEIGHT, BYTECOUNT>
{
    type Color = Color;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for pixel in pixels {
            self.set_pixel(pixel);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill(color.get_byte_value());
        Ok(())
    }
}

/// For use with embedded_grahics
impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> OriginDimensions
    for Display<WIDTH, HEIGHT, BYTECOUNT>
{
    fn size(&self) -> Size {
        rotated_size(WIDTH, HEIGHT, self.rotation)
    }
}

impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> Display<WIDTH, HEIGHT, BYTECOUNT> {
    /// get internal buffer to use it (to draw in epd)
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Set the display rotation.
    ///
    /// This only concerns future drawing made to it. Anything aready drawn
    /// stays as it is in the buffer.
    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        self.rotation = rotation;
    }

    /// Get current rotation
    pub fn rotation(&self) -> DisplayRotation {
        self.rotation
    }

    /// Set a specific pixel color on this display
    pub fn set_pixel(&mut self, pixel: Pixel<Color>) {
        let Pixel(point, color) = pixel;
        let Some((x, y)) = panel_coordinates(point, WIDTH, HEIGHT, self.rotation) else {
            // don't do anything in case of out of range
            return;
        };

        let index = x as usize / 8 + y as usize * line_bytes(WIDTH);
        let bit = 0x80 >> (x % 8);
        match color {
            Color::Black => self.buffer[index] &= !bit,
            Color::White => self.buffer[index] |= bit,
        }
    }
}

/// 8 bit gray source buffer for the shade renderer
///
/// Every byte holds the ink coverage of one pixel: `255 - luma`, so
/// [`Gray8::BLACK`] is stored as 255 and the default white as 0. That is the
/// sample format expected by
/// [`draw_gray_shades`](crate::epd4in2::Epd4in2::draw_gray_shades).
///
/// - BYTECOUNT: `WIDTH * HEIGHT`
pub struct GrayDisplay<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> {
    buffer: [u8; BYTECOUNT],
    rotation: DisplayRotation,
}

impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> Default
    for GrayDisplay<WIDTH, HEIGHT, BYTECOUNT>
{
    /// Initialize display with white pixels
    #[inline(always)]
    fn default() -> Self {
        Self {
            buffer: [0u8; BYTECOUNT],
            rotation: DisplayRotation::default(),
        }
    }
}

impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> DrawTarget
    for GrayDisplay<WIDTH, HEIGHT, BYTECOUNT>
{
    type Color = Gray8;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for pixel in pixels {
            self.set_pixel(pixel);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill(u8::MAX - color.luma());
        Ok(())
    }
}

impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize> OriginDimensions
    for GrayDisplay<WIDTH, HEIGHT, BYTECOUNT>
{
    fn size(&self) -> Size {
        rotated_size(WIDTH, HEIGHT, self.rotation)
    }
}

impl<const WIDTH: u32, const HEIGHT: u32, const BYTECOUNT: usize>
    GrayDisplay<WIDTH, HEIGHT, BYTECOUNT>
{
    /// get internal buffer to use it (to draw in epd)
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Set the display rotation.
    ///
    /// This only concerns future drawing made to it.
    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        self.rotation = rotation;
    }

    /// Get current rotation
    pub fn rotation(&self) -> DisplayRotation {
        self.rotation
    }

    /// Set a specific pixel color on this display
    pub fn set_pixel(&mut self, pixel: Pixel<Gray8>) {
        let Pixel(point, color) = pixel;
        if let Some((x, y)) = panel_coordinates(point, WIDTH, HEIGHT, self.rotation) {
            self.buffer[x as usize + y as usize * WIDTH as usize] = u8::MAX - color.luma();
        }
    }
}
