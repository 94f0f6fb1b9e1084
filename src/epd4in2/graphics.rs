use crate::buffer_len;
use crate::epd4in2::{HEIGHT, WIDTH};
use crate::graphics::{Display, GrayDisplay};

/// Full size buffer for use with the 4in2 EPD
///
/// Can also be manually constructed:
/// `buffer: [DEFAULT_BACKGROUND_COLOR.get_byte_value(); WIDTH / 8 * HEIGHT]`
pub type Display4in2 = Display<WIDTH, HEIGHT, { buffer_len(WIDTH as usize, HEIGHT as usize) }>;

/// Full size 8 bit gray source for the shade renderer of the 4in2 EPD
pub type GrayDisplay4in2 = GrayDisplay<WIDTH, HEIGHT, { WIDTH as usize * HEIGHT as usize }>;
