//! Recording fakes for the bus traits
//!
//! Every SPI byte is logged together with the level of the DC pin at the time
//! it was written, so the command stream of the driver can be checked frame by
//! frame.

#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, Operation, SpiDevice};

use epd4in2_shades::epd4in2::{Config, Epd4in2};

#[derive(Debug, Default)]
pub struct BusLog {
    dc_high: bool,
    /// (dc high, byte)
    pub writes: Vec<(bool, u8)>,
    pub delays_ms: Vec<u32>,
    pub reset_pulses: usize,
    pub busy_polls: usize,
    /// Idle polls before `busy_for` starts counting
    pub busy_after: usize,
    /// Polls left that report busy
    pub busy_for: usize,
}

pub type Shared = Rc<RefCell<BusLog>>;

pub struct FakeSpi(pub Shared);
pub struct FakeDc(pub Shared);
pub struct FakeRst(pub Shared);
pub struct FakeBusy(pub Shared);
pub struct FakeDelay(pub Shared);

impl SpiErrorType for FakeSpi {
    type Error = Infallible;
}

impl SpiDevice for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut log = self.0.borrow_mut();
        for op in operations {
            if let Operation::Write(bytes) = op {
                let dc = log.dc_high;
                log.writes.extend(bytes.iter().map(|&b| (dc, b)));
            }
        }
        Ok(())
    }
}

impl PinErrorType for FakeDc {
    type Error = Infallible;
}

impl OutputPin for FakeDc {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().dc_high = true;
        Ok(())
    }
}

impl PinErrorType for FakeRst {
    type Error = Infallible;
}

impl OutputPin for FakeRst {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().reset_pulses += 1;
        Ok(())
    }
}

impl PinErrorType for FakeBusy {
    type Error = Infallible;
}

impl InputPin for FakeBusy {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        let mut log = self.0.borrow_mut();
        log.busy_polls += 1;
        if log.busy_after > 0 {
            log.busy_after -= 1;
            Ok(false)
        } else if log.busy_for > 0 {
            log.busy_for -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().delays_ms.push(ms);
    }
}

pub type TestEpd = Epd4in2<FakeSpi, FakeBusy, FakeDc, FakeRst, FakeDelay>;

/// Creates a driver on a fresh recording bus
pub fn setup(config: Config) -> (TestEpd, FakeSpi, Shared) {
    let log = Shared::default();
    let mut spi = FakeSpi(log.clone());
    let epd = Epd4in2::new(
        &mut spi,
        FakeBusy(log.clone()),
        FakeDc(log.clone()),
        FakeRst(log.clone()),
        FakeDelay(log.clone()),
        config,
    )
    .unwrap();
    (epd, spi, log)
}

/// A command byte with the data bytes that followed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: u8,
    pub data: Vec<u8>,
}

/// Splits the recorded bytes at every command byte
pub fn frames(log: &Shared) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for &(dc_high, byte) in log.borrow().writes.iter() {
        if dc_high {
            frames
                .last_mut()
                .expect("data before the first command")
                .data
                .push(byte);
        } else {
            frames.push(Frame {
                command: byte,
                data: Vec::new(),
            });
        }
    }
    frames
}

/// Forgets everything recorded so far
pub fn clear(log: &Shared) {
    let mut log = log.borrow_mut();
    log.writes.clear();
    log.delays_ms.clear();
    log.reset_pulses = 0;
    log.busy_polls = 0;
}

pub fn commands(frames: &[Frame]) -> Vec<u8> {
    frames.iter().map(|f| f.command).collect()
}

pub fn find(frames: &[Frame], command: u8) -> Vec<&Frame> {
    frames.iter().filter(|f| f.command == command).collect()
}
