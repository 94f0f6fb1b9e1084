//! A Driver for the Waveshare 4.2" E-Ink Display via SPI
//!
//! Build with the help of documentation/code from [Waveshare](https://www.waveshare.com/wiki/4.2inch_e-Paper_Module),
//! [Ben Krasnows partial Refresh tips](https://benkrasnow.blogspot.de/2017/10/fast-partial-refresh-on-42-e-paper.html) and
//! the IL0398 datasheet.
//!
//! Besides the full refresh the driver offers
//!
//! - a quick refresh with Ben Krasnow's LUTs ([`Epd4in2::display_frame_quick`]),
//! - a healthy quick refresh which drives the W2W/B2B transitions once every
//!   [`HEAVY_CYCLE_NR`] refreshes to keep ghosting in check
//!   ([`Epd4in2::display_frame_quick_and_healthy`]),
//! - a gray shade renderer drawing 8 bit images in [`SHADES`] levels
//!   ([`Epd4in2::draw_gray_shades`]).
//!
//! # Example
//!
//! ```ignore
//! let mut epd = Epd4in2::new(&mut spi, busy, dc, rst, delay, Config::default())?;
//!
//! epd.startup_clear(&mut spi)?;
//! epd.update_and_display_frame(&mut spi, Some(display.buffer()))?;
//!
//! // animate with quick refreshes
//! epd.update_partial_frame(&mut spi, Some(frame), 0, 0, WIDTH, HEIGHT, TransmissionChannel::New)?;
//! epd.display_frame_quick_and_healthy(&mut spi, false)?;
//! epd.wait_until_idle(&mut spi)?;
//!
//! epd.sleep(&mut spi)?;
//! ```
//!
//! BE CAREFUL! The screen can get ghosting/burn-ins through the Partial Fast Update Drawing.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};
use log::{debug, trace};

use crate::buffer_len;
use crate::color::Color;
use crate::error::ErrorKind;
use crate::interface::DisplayInterface;
use crate::rect::Rect;

pub(crate) mod command;
use self::command::Command;

mod constants;
pub use self::constants::{
    DEFAULT_SPEED, GRAY_SPEED, HEAVY_CYCLE_NR, LUT_LEN, LUT_VCOM_LEN, SHADES,
    STARTUP_CLEAR_CYCLES,
};
use self::constants::{
    POWER_SEQUENCE_MS, RESET_LOW_MS, RESET_RECOVERY_MS, TRANSFER_SETTLE_MS,
};

mod waveform;
pub use self::waveform::{
    shade_frame_count, DriveStrength, RefreshLut, RowRepeats, WeakCycleCounter,
};
use self::waveform::Waveform;

pub mod shades;

#[cfg(feature = "graphics")]
mod graphics;
#[cfg(feature = "graphics")]
pub use self::graphics::{Display4in2, GrayDisplay4in2};

/// Width of the display
pub const WIDTH: u32 = 400;
/// Height of the display
pub const HEIGHT: u32 = 300;
/// Default Background Color
pub const DEFAULT_BACKGROUND_COLOR: Color = Color::White;
const SINGLE_BYTE_WRITE: bool = true;

/// Bytes of a full 1 bit frame
const FRAME_BYTES: u32 = buffer_len(WIDTH as usize, HEIGHT as usize) as u32;
/// Packed bytes per SPI data burst in the shade renderer, one full panel row
const SHADE_ROW_BYTES: usize = WIDTH as usize / 8;

/// PLL refresh rate divisor pair
///
/// The frame rate is derived from `M` (bits 5..3) and `N` (bits 2..0) of the
/// PLL_CONTROL byte, see page 17 of the 4.2" specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeedCoefficients {
    /// M divisor, 3 bits
    pub m: u8,
    /// N divisor, 3 bits
    pub n: u8,
}

impl SpeedCoefficients {
    /// Creates a new coefficient pair
    pub const fn new(m: u8, n: u8) -> Self {
        SpeedCoefficients { m, n }
    }

    /// The data byte of the PLL_CONTROL command
    ///
    /// `0x3A` for the 100Hz default, `0x29` for (5, 1), `0x3C` for the 50Hz
    /// power-on value.
    pub const fn pll_byte(self) -> u8 {
        0x3F & (((self.m << 3) & 0x38) | (self.n & 0x07))
    }
}

impl Default for SpeedCoefficients {
    fn default() -> Self {
        DEFAULT_SPEED
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Refresh rate used by [`Epd4in2::new`]
    pub speed: SpeedCoefficients,
    /// Maximum time to wait for the busy line, `None` waits forever
    pub busy_timeout_ms: Option<u32>,
}

impl Config {
    /// The default configuration: 100Hz and no busy timeout
    pub const fn new() -> Self {
        Config {
            speed: DEFAULT_SPEED,
            busy_timeout_ms: None,
        }
    }

    /// Use another refresh rate
    pub const fn with_speed(mut self, speed: SpeedCoefficients) -> Self {
        self.speed = speed;
        self
    }

    /// Report [`ErrorKind::PanelUnresponsive`] instead of waiting forever
    pub const fn with_busy_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.busy_timeout_ms = Some(timeout_ms);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

/// Lifecycle state of the panel as far as the driver knows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Reset or never initialised, needs [`Epd4in2::init`]
    Uninitialized,
    /// Powered and ready for frames
    Active,
    /// In deep sleep, only [`Epd4in2::reset`] brings it back
    Asleep,
}

/// Which of the two controller SRAMs receives frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransmissionChannel {
    /// DATA_START_TRANSMISSION_1, the "old" frame
    Old,
    /// DATA_START_TRANSMISSION_2, the "new" frame
    #[default]
    New,
}

impl TransmissionChannel {
    fn command(self) -> Command {
        match self {
            TransmissionChannel::Old => Command::DataStartTransmission1,
            TransmissionChannel::New => Command::DataStartTransmission2,
        }
    }
}

/// 1 selects the old frame, every other value the new one
impl From<u8> for TransmissionChannel {
    fn from(dtm: u8) -> Self {
        match dtm {
            1 => TransmissionChannel::Old,
            _ => TransmissionChannel::New,
        }
    }
}

/// Epd4in2 driver
///
pub struct Epd4in2<SPI, BUSY, DC, RST, DELAY> {
    /// Connection Interface
    interface: DisplayInterface<SPI, BUSY, DC, RST, DELAY, SINGLE_BYTE_WRITE>,
    /// Last refresh rate sent with PLL_CONTROL
    speed: SpeedCoefficients,
    /// Position in the healthy quick refresh cycle
    weak_cycles: WeakCycleCounter,
    /// Lifecycle state
    power: PowerState,
}

type EpdResult<T, SPI, BUSY, DC, RST> = Result<T, ErrorKind<SPI, BUSY, DC, RST>>;

impl<SPI, BUSY, DC, RST, DELAY> Epd4in2<SPI, BUSY, DC, RST, DELAY>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Creates a new driver from a SPI peripheral, Busy InputPin, DC and RST OutputPins
    /// and a delay.
    ///
    /// This already resets and initialises the device with `config.speed`.
    pub fn new(
        spi: &mut SPI,
        busy: BUSY,
        dc: DC,
        rst: RST,
        delay: DELAY,
        config: Config,
    ) -> EpdResult<Self, SPI, BUSY, DC, RST> {
        let interface = DisplayInterface::new(busy, dc, rst, delay, config.busy_timeout_ms);

        let mut epd = Epd4in2 {
            interface,
            speed: config.speed,
            weak_cycles: WeakCycleCounter::new(),
            power: PowerState::Uninitialized,
        };

        epd.reset()?;
        epd.init(spi, config.speed)?;

        Ok(epd)
    }

    /// Releases the pins and the delay
    pub fn release(self) -> (BUSY, DC, RST, DELAY) {
        self.interface.release()
    }

    /// Width of the display
    pub fn width(&self) -> u32 {
        WIDTH
    }

    /// Height of the display
    pub fn height(&self) -> u32 {
        HEIGHT
    }

    /// The refresh rate coefficients the panel is running at
    pub fn speed_coefficients(&self) -> SpeedCoefficients {
        self.speed
    }

    /// Position in the healthy quick refresh cycle, 0 means the next one is strong
    pub fn weak_cycle_count(&self) -> u8 {
        self.weak_cycles.count()
    }

    /// Makes the next healthy quick refresh a strong one.
    ///
    /// Useful after the panel was idle for a long time.
    pub fn reset_weak_cycles(&mut self) {
        self.weak_cycles.reset();
    }

    /// Lifecycle state as tracked by the driver
    pub fn power_state(&self) -> PowerState {
        self.power
    }

    /// Powers the panel up and sets the refresh rate.
    ///
    /// The panel needs to be out of deep sleep, see [`reset`](Self::reset).
    pub fn init(&mut self, spi: &mut SPI, speed: SpeedCoefficients) -> EpdResult<(), SPI, BUSY, DC, RST> {
        debug!("init with speed coefficients {:?}", speed);

        // VDS_EN, VDG_EN / VCOM_HV, VGHL_LV / VDH / VDL / VDHR
        self.interface
            .cmd_with_data(spi, Command::PowerSetting, &[0x03, 0x00, 0x2b, 0x2b, 0xff])?;

        // 07 0f 17 1f 27 2F 37 2f
        self.interface
            .cmd_with_data(spi, Command::BoosterSoftStart, &[0x17, 0x17, 0x17])?;

        self.interface.cmd(spi, Command::PowerOn)?;
        self.wait_until_idle(spi)?;

        // 400x300, LUT set by register, B/W mode, scan bottom-top, pixels left to right
        self.interface
            .cmd_with_data(spi, Command::PanelSetting, &[0x3F])?;

        self.interface
            .cmd_with_data(spi, Command::PllControl, &[speed.pll_byte()])?;

        self.speed = speed;
        self.power = PowerState::Active;
        Ok(())
    }

    /// Resets the device.
    ///
    /// Often used to awake the module from deep sleep. See [Epd4in2::sleep()](Epd4in2::sleep())
    ///
    /// The panel is back in its power-on state afterwards and needs [`init`](Self::init).
    pub fn reset(&mut self) -> EpdResult<(), SPI, BUSY, DC, RST> {
        debug!("reset");
        self.interface.reset(RESET_LOW_MS, RESET_RECOVERY_MS)?;
        self.power = PowerState::Uninitialized;
        Ok(())
    }

    /// Let the device enter deep-sleep mode to save power.
    ///
    /// The deep sleep mode returns to standby with a hardware reset.
    pub fn sleep(&mut self, spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        debug!("sleep");
        // border floating
        self.interface
            .cmd_with_data(spi, Command::VcomAndDataIntervalSetting, &[0x17])?;
        // VCOM to 0V
        self.interface.cmd(spi, Command::VcmDcSetting)?;
        self.interface.cmd(spi, Command::PanelSetting)?;
        self.interface.delay_ms(POWER_SEQUENCE_MS);

        // VG&VS to 0V fast
        self.interface
            .cmd_with_data(spi, Command::PowerSetting, &[0x00; 5])?;
        self.interface.delay_ms(POWER_SEQUENCE_MS);

        self.interface.cmd(spi, Command::PowerOff)?;
        self.wait_until_idle(spi)?;

        // the check code, without it the command is ignored
        self.interface
            .cmd_with_data(spi, Command::DeepSleep, &[0xA5])?;

        self.power = PowerState::Asleep;
        Ok(())
    }

    /// Wakes the device up from sleep: [`reset`](Self::reset) followed by [`init`](Self::init)
    pub fn wake_up(&mut self, spi: &mut SPI, speed: SpeedCoefficients) -> EpdResult<(), SPI, BUSY, DC, RST> {
        debug!("wake up");
        self.reset()?;
        self.init(spi, speed)
    }

    /// Wait until the display has stopped processing data
    ///
    /// You can call this to make sure a frame is displayed before goin further
    pub fn wait_until_idle(&mut self, _spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.interface.wait_until_idle()
    }

    /// Clears both frame SRAMs to white, this won't refresh the display
    pub fn clear_frame(&mut self, spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.send_resolution(spi)?;

        let color = DEFAULT_BACKGROUND_COLOR.get_byte_value();

        for channel in [TransmissionChannel::Old, TransmissionChannel::New] {
            self.interface.cmd(spi, channel.command())?;
            self.interface.delay_ms(TRANSFER_SETTLE_MS);
            self.interface.data_x_times(spi, color, FRAME_BYTES)?;
            self.interface.delay_ms(TRANSFER_SETTLE_MS);
        }
        Ok(())
    }

    /// Transmits partial data to the SRAM of the EPD
    ///
    /// (x,y) is the top left corner, `x` is rounded down to a multiple of 8.
    ///
    /// BUFFER needs to be of size: width / 8 * height !
    /// With `None` the window is filled black.
    #[allow(clippy::too_many_arguments)]
    pub fn update_partial_frame(
        &mut self,
        spi: &mut SPI,
        buffer: Option<&[u8]>,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        channel: TransmissionChannel,
    ) -> EpdResult<(), SPI, BUSY, DC, RST> {
        let window = Rect::new(x, y, width, height);
        self.send_partial_window(spi, window, channel)?;

        let len = window.byte_len();
        match buffer {
            Some(buffer) => {
                debug_assert!(buffer.len() >= len as usize, "buffer too small for window");
                let len = buffer.len().min(len as usize);
                self.interface.data(spi, &buffer[..len])?;
            }
            None => {
                self.interface
                    .data_x_times(spi, Color::Black.get_byte_value(), len)?;
            }
        }

        self.interface.cmd(spi, Command::PartialOut)
    }

    /// Transmits a full frame and displays it with the full LUT
    ///
    /// The old frame SRAM is set to white first. With `None` the SRAM content
    /// stays as it is and is refreshed once more.
    ///
    /// This function waits until the device isn`t busy anymore
    pub fn update_and_display_frame(
        &mut self,
        spi: &mut SPI,
        buffer: Option<&[u8]>,
    ) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.send_resolution(spi)?;

        // VCOM to -0.7V
        self.interface
            .cmd_with_data(spi, Command::VcmDcSetting, &[0x12])?;

        //VBDF 17|D7 VBDW 97  VBDB 57  VBDF F7  VBDW 77  VBDB 37  VBDR B7
        self.interface
            .cmd_with_data(spi, Command::VcomAndDataIntervalSetting, &[0x97])?;

        if let Some(buffer) = buffer {
            debug_assert!(buffer.len() >= FRAME_BYTES as usize, "buffer too small for frame");
            let len = buffer.len().min(FRAME_BYTES as usize);

            self.interface.cmd(spi, Command::DataStartTransmission1)?;
            self.interface
                .data_x_times(spi, DEFAULT_BACKGROUND_COLOR.get_byte_value(), FRAME_BYTES)?;
            self.interface.delay_ms(TRANSFER_SETTLE_MS);

            self.interface
                .cmd_with_data(spi, Command::DataStartTransmission2, &buffer[..len])?;
            self.interface.delay_ms(TRANSFER_SETTLE_MS);
        }

        self.display_frame(spi)
    }

    /// Displays the frame data from SRAM with the full LUT
    ///
    /// This function waits until the device isn`t busy anymore
    pub fn display_frame(&mut self, spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.set_lut(spi, RefreshLut::Full)?;
        self.interface.cmd(spi, Command::DisplayRefresh)?;
        self.interface.delay_ms(POWER_SEQUENCE_MS);
        self.wait_until_idle(spi)
    }

    /// Displays the frame data from SRAM with the quick LUT
    ///
    /// WARNING: Quick Refresh might lead to ghosting-effects, prefer
    /// [`display_frame_quick_and_healthy`](Self::display_frame_quick_and_healthy)
    /// for repeated updates.
    ///
    /// This function waits until the device isn`t busy anymore
    pub fn display_frame_quick(&mut self, spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.set_lut(spi, RefreshLut::Quick)?;
        self.interface.cmd(spi, Command::DisplayRefresh)?;
        self.wait_until_idle(spi)
    }

    /// Displays the frame data from SRAM with the healthy quick LUT
    ///
    /// Every [`HEAVY_CYCLE_NR`]th call drives the W2W and B2B transitions.
    /// `reset_cycle` restarts the cycle so this call is a strong one.
    ///
    /// Doesn't wait for the refresh to finish, see [`wait_until_idle`](Self::wait_until_idle).
    pub fn display_frame_quick_and_healthy(
        &mut self,
        spi: &mut SPI,
        reset_cycle: bool,
    ) -> EpdResult<(), SPI, BUSY, DC, RST> {
        if reset_cycle {
            self.weak_cycles.reset();
        }
        self.set_lut(spi, RefreshLut::QuickAndHealthy)?;
        self.interface.cmd(spi, Command::DisplayRefresh)
    }

    /// Displays the frame data from SRAM with the shade LUT of `pass`
    ///
    /// Doesn't wait for the refresh to finish, see [`wait_until_idle`](Self::wait_until_idle).
    pub fn display_frame_shades(&mut self, spi: &mut SPI, pass: u8) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.set_lut(spi, RefreshLut::Shades(pass))?;
        self.interface.cmd(spi, Command::DisplayRefresh)
    }

    /// Sends the LUT set of `refresh` without refreshing
    ///
    /// [`RefreshLut::QuickAndHealthy`] advances the weak cycle counter.
    pub fn set_lut(&mut self, spi: &mut SPI, refresh: RefreshLut) -> EpdResult<(), SPI, BUSY, DC, RST> {
        let waveform = match refresh {
            RefreshLut::Full => Waveform::Full,
            RefreshLut::Quick => Waveform::Quick,
            RefreshLut::QuickAndHealthy => {
                let strength = self.weak_cycles.advance();
                trace!(
                    "healthy quick refresh: {:?}, next cycle {}",
                    strength,
                    self.weak_cycles.count()
                );
                Waveform::Healthy(strength)
            }
            RefreshLut::Shades(pass) => Waveform::Shade(pass),
        };

        let tables = waveform.tables();
        for (command, table) in tables.commands() {
            self.interface.cmd_with_data(spi, command, table)?;
        }
        Ok(())
    }

    /// Draws an 8 bit gray image (one byte per pixel) in [`SHADES`] levels
    ///
    /// The image is placed at the top left corner, `width` needs to be a
    /// multiple of 8. With `None` every pass draws black.
    ///
    /// The shade LUTs need the panel to run at [`GRAY_SPEED`]. If it runs at
    /// another speed the panel is reset and reinitialised before the passes
    /// and brought back to the old speed afterwards.
    pub fn draw_gray_shades(
        &mut self,
        spi: &mut SPI,
        buffer: Option<&[u8]>,
        width: u32,
        height: u32,
    ) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.draw_gray_shades_while(spi, buffer, width, height, |_| true)
    }

    /// Same as [`draw_gray_shades`](Self::draw_gray_shades), but asks
    /// `keep_going` with the pass index before every pass and stops early once
    /// it returns false.
    ///
    /// The refresh rate is restored on every way out, also on errors.
    pub fn draw_gray_shades_while<F>(
        &mut self,
        spi: &mut SPI,
        buffer: Option<&[u8]>,
        width: u32,
        height: u32,
        keep_going: F,
    ) -> EpdResult<(), SPI, BUSY, DC, RST>
    where
        F: FnMut(u8) -> bool,
    {
        let saved = self.speed;
        let switch_speed = saved != GRAY_SPEED;
        debug!("drawing {}x{} in {} shades", width, height, SHADES);

        let mut drawn = Ok(());
        if switch_speed {
            drawn = self.wake_up(spi, GRAY_SPEED);
        }
        if drawn.is_ok() {
            drawn = self.shade_passes(spi, buffer, width, height, keep_going);
        }

        if switch_speed {
            debug!("restoring speed coefficients {:?}", saved);
            // the first error wins, the restore runs regardless
            let restored = self.wake_up(spi, saved);
            drawn.and(restored)
        } else {
            drawn
        }
    }

    /// Full refreshes to remove forced pixels of a previous image
    ///
    /// Done [`STARTUP_CLEAR_CYCLES`] times, clearing both SRAMs to white.
    pub fn startup_clear(&mut self, spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        debug!("startup clear");
        for _ in 0..STARTUP_CLEAR_CYCLES {
            self.clear_frame(spi)?;
            self.display_frame(spi)?;
        }
        Ok(())
    }

    fn shade_passes<F>(
        &mut self,
        spi: &mut SPI,
        buffer: Option<&[u8]>,
        width: u32,
        height: u32,
        mut keep_going: F,
    ) -> EpdResult<(), SPI, BUSY, DC, RST>
    where
        F: FnMut(u8) -> bool,
    {
        let window = Rect::new(0, 0, width, height);
        let len = window.byte_len() as usize;
        let mut row = [0u8; SHADE_ROW_BYTES];

        for pass in 0..SHADES - 1 {
            if !keep_going(pass) {
                debug!("gray shades stopped before pass {}", pass);
                break;
            }
            let threshold = shades::threshold(pass);
            trace!("shade pass {} with threshold {}", pass, threshold);

            self.send_partial_window(spi, window, TransmissionChannel::New)?;
            match buffer {
                Some(buffer) => {
                    let pixels = len.saturating_mul(8);
                    debug_assert!(buffer.len() >= pixels, "buffer too small for image");
                    let samples = &buffer[..buffer.len().min(pixels)];
                    for group in samples.chunks(SHADE_ROW_BYTES * 8) {
                        let packed = shades::pack_into(group, threshold, &mut row);
                        self.interface.data(spi, &row[..packed])?;
                    }
                }
                None => {
                    self.interface
                        .data_x_times(spi, Color::Black.get_byte_value(), len as u32)?;
                }
            }
            self.interface.cmd(spi, Command::PartialOut)?;

            self.display_frame_shades(spi, pass)?;
            self.wait_until_idle(spi)?;
        }
        Ok(())
    }

    fn send_partial_window(
        &mut self,
        spi: &mut SPI,
        window: Rect,
        channel: TransmissionChannel,
    ) -> EpdResult<(), SPI, BUSY, DC, RST> {
        self.interface.cmd(spi, Command::PartialIn)?;
        self.interface
            .cmd_with_data(spi, Command::PartialWindow, &window.partial_window_data())?;
        self.interface.cmd(spi, channel.command())
    }

    fn send_resolution(&mut self, spi: &mut SPI) -> EpdResult<(), SPI, BUSY, DC, RST> {
        let w = self.width();
        let h = self.height();

        self.interface.cmd_with_data(
            spi,
            Command::ResolutionSetting,
            &[(w >> 8) as u8, w as u8, (h >> 8) as u8, h as u8],
        )
    }
}
