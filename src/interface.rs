use crate::{error::ErrorKind, traits::Command};
use core::marker::PhantomData;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::SpiDevice,
};
use log::warn;

/// The Connection Interface of the EPD
///
/// SINGLE_BYTE_WRITE defines if a data block is written bytewise
/// or blockwise to the spi device
pub(crate) struct DisplayInterface<SPI, BUSY, DC, RST, DELAY, const SINGLE_BYTE_WRITE: bool> {
    /// SPI
    _spi: PhantomData<SPI>,
    /// Low for busy, Wait until display is ready!
    busy: BUSY,
    /// Data/Command Control Pin (High for data, Low for command)
    dc: DC,
    /// Pin for Resetting
    rst: RST,
    /// Blocking delay provider
    delay: DELAY,
    /// Give up waiting on the busy line after this many ms, `None` waits forever
    busy_timeout_ms: Option<u32>,
}

impl<SPI, BUSY, DC, RST, DELAY, const SINGLE_BYTE_WRITE: bool>
    DisplayInterface<SPI, BUSY, DC, RST, DELAY, SINGLE_BYTE_WRITE>
where
    SPI: SpiDevice,
    BUSY: InputPin,
    DC: OutputPin,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Creates a new `DisplayInterface` struct
    pub fn new(busy: BUSY, dc: DC, rst: RST, delay: DELAY, busy_timeout_ms: Option<u32>) -> Self {
        DisplayInterface {
            _spi: PhantomData,
            busy,
            dc,
            rst,
            delay,
            busy_timeout_ms,
        }
    }

    /// Hands the pins and the delay back
    pub fn release(self) -> (BUSY, DC, RST, DELAY) {
        (self.busy, self.dc, self.rst, self.delay)
    }

    /// Basic function for sending [Commands](Command).
    ///
    /// Enables direct interaction with the device with the help of [data()](DisplayInterface::data())
    pub(crate) fn cmd<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        // low for commands
        self.dc.set_low().map_err(ErrorKind::DcError)?;

        // Transfer the command over spi
        self.write(spi, &[command.address()])
    }

    /// Basic function for sending an array of u8-values of data over spi
    pub(crate) fn data(
        &mut self,
        spi: &mut SPI,
        data: &[u8],
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        // high for data
        self.dc.set_high().map_err(ErrorKind::DcError)?;

        if SINGLE_BYTE_WRITE {
            for val in data.iter().copied() {
                // Transfer data one u8 at a time over spi
                self.write(spi, &[val])?;
            }
        } else {
            self.write(spi, data)?;
        }

        Ok(())
    }

    /// Basic function for sending [Commands](Command) and the data belonging to it.
    pub(crate) fn cmd_with_data<T: Command>(
        &mut self,
        spi: &mut SPI,
        command: T,
        data: &[u8],
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        self.cmd(spi, command)?;
        self.data(spi, data)
    }

    /// Basic function for sending the same byte of data (one u8) multiple times over spi
    pub(crate) fn data_x_times(
        &mut self,
        spi: &mut SPI,
        val: u8,
        repetitions: u32,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        // high for data
        self.dc.set_high().map_err(ErrorKind::DcError)?;
        // Transfer data (u8) over spi
        for _ in 0..repetitions {
            self.write(spi, &[val])?;
        }
        Ok(())
    }

    // spi write helper/abstraction function
    fn write(&mut self, spi: &mut SPI, data: &[u8]) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        // Be careful!! Linux has a default limit of 4096 bytes per spi transfer
        // see https://raspberrypi.stackexchange.com/questions/65595/spi-transfer-fails-with-buffer-size-greater-than-4096
        if cfg!(target_os = "linux") {
            for data_chunk in data.chunks(4096) {
                spi.write(data_chunk).map_err(ErrorKind::SpiError)?;
            }
            Ok(())
        } else {
            spi.write(data).map_err(ErrorKind::SpiError)
        }
    }

    /// Waits until device isn't busy anymore (busy == HIGH)
    ///
    /// The busy line is polled once per millisecond. Without a configured timeout
    /// this blocks for as long as the panel keeps the line low.
    pub(crate) fn wait_until_idle(&mut self) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        let mut waited_ms: u32 = 0;
        while self.is_busy()? {
            if let Some(limit) = self.busy_timeout_ms {
                if waited_ms >= limit {
                    warn!("busy line still low after {} ms", waited_ms);
                    return Err(ErrorKind::PanelUnresponsive);
                }
            }
            self.delay.delay_ms(1);
            waited_ms = waited_ms.saturating_add(1);
        }
        Ok(())
    }

    /// Checks if device is still busy
    ///
    /// The 4.2" panel pulls the busy line low while it is working
    pub(crate) fn is_busy(&mut self) -> Result<bool, ErrorKind<SPI, BUSY, DC, RST>> {
        self.busy.is_low().map_err(ErrorKind::BusyError)
    }

    pub(crate) fn delay_ms(&mut self, duration: u32) {
        self.delay.delay_ms(duration)
    }

    /// Resets the device.
    ///
    /// Often used to awake the module from deep sleep. See [Epd4in2::sleep()](crate::epd4in2::Epd4in2::sleep())
    ///
    /// Keeps the reset pin low for `duration` ms and waits `recovery` ms after
    /// releasing it again.
    pub(crate) fn reset(
        &mut self,
        duration: u32,
        recovery: u32,
    ) -> Result<(), ErrorKind<SPI, BUSY, DC, RST>> {
        self.rst.set_low().map_err(ErrorKind::RstError)?;
        self.delay.delay_ms(duration);
        self.rst.set_high().map_err(ErrorKind::RstError)?;
        self.delay.delay_ms(recovery);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use std::vec;
    use std::vec::Vec;

    #[derive(Clone, Copy)]
    struct Raw(u8);

    impl Command for Raw {
        fn address(self) -> u8 {
            self.0
        }
    }

    type Interface<const SINGLE: bool> =
        DisplayInterface<SpiMock<u8>, PinMock, PinMock, PinMock, NoopDelay, SINGLE>;

    fn byte_write(byte: u8) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write(byte),
            SpiTransaction::transaction_end(),
        ]
    }

    fn finish<const SINGLE: bool>(interface: Interface<SINGLE>, mut spi: SpiMock<u8>) {
        let (mut busy, mut dc, mut rst, _) = interface.release();
        busy.done();
        dc.done();
        rst.done();
        spi.done();
    }

    #[test]
    fn command_pulls_dc_low() {
        let mut spi = SpiMock::new(&byte_write(0x12));
        let busy = PinMock::new(&[]);
        let dc = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let rst = PinMock::new(&[]);

        let mut interface: Interface<true> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), None);
        interface.cmd(&mut spi, Raw(0x12)).unwrap();
        finish(interface, spi);
    }

    #[test]
    fn single_byte_data_is_one_transfer_per_byte() {
        let mut expectations = byte_write(0x01);
        expectations.extend(byte_write(0x90));
        expectations.extend(byte_write(0x2C));
        let mut spi = SpiMock::new(&expectations);
        let busy = PinMock::new(&[]);
        let dc = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let rst = PinMock::new(&[]);

        let mut interface: Interface<true> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), None);
        interface.data(&mut spi, &[0x01, 0x90, 0x2C]).unwrap();
        finish(interface, spi);
    }

    #[test]
    fn block_data_is_one_transfer() {
        let mut spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write_vec(vec![0xA5, 0x5A]),
            SpiTransaction::transaction_end(),
        ]);
        let busy = PinMock::new(&[]);
        let dc = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let rst = PinMock::new(&[]);

        let mut interface: Interface<false> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), None);
        interface.data(&mut spi, &[0xA5, 0x5A]).unwrap();
        finish(interface, spi);
    }

    #[test]
    fn repeated_data() {
        let mut expectations = Vec::new();
        for _ in 0..4 {
            expectations.extend(byte_write(0xFF));
        }
        let mut spi = SpiMock::new(&expectations);
        let busy = PinMock::new(&[]);
        let dc = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let rst = PinMock::new(&[]);

        let mut interface: Interface<true> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), None);
        interface.data_x_times(&mut spi, 0xFF, 4).unwrap();
        finish(interface, spi);
    }

    #[test]
    fn reset_pulses_low_then_high() {
        let spi = SpiMock::new(&[]);
        let busy = PinMock::new(&[]);
        let dc = PinMock::new(&[]);
        let rst = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);

        let mut interface: Interface<true> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), None);
        interface.reset(200, 200).unwrap();
        finish(interface, spi);
    }

    #[test]
    fn wait_until_idle_polls_until_high() {
        let spi = SpiMock::new(&[]);
        let busy = PinMock::new(&[
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ]);
        let dc = PinMock::new(&[]);
        let rst = PinMock::new(&[]);

        let mut interface: Interface<true> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), None);
        interface.wait_until_idle().unwrap();
        finish(interface, spi);
    }

    #[test]
    fn wait_until_idle_times_out() {
        let spi = SpiMock::new(&[]);
        let busy = PinMock::new(&[
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::Low),
        ]);
        let dc = PinMock::new(&[]);
        let rst = PinMock::new(&[]);

        let mut interface: Interface<true> =
            DisplayInterface::new(busy, dc, rst, NoopDelay::new(), Some(2));
        let err = interface.wait_until_idle().unwrap_err();
        assert!(err.is_timeout());
        finish(interface, spi);
    }
}
