//! SPI Commands for the Waveshare 4.2" E-Ink Display
use crate::traits;

/// EPD4IN2 commands (IL0398)
///
/// Should rarely (never?) be needed directly.
///
/// The temperature sensor, OTP and status commands are listed for completeness.
/// The Waveshare board doesn't connect the read pin, so they are never issued.
#[allow(dead_code)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// Resolution, LUT source, B/W or B/W/R pixels, scan directions, booster switch, soft reset
    ///
    /// 0x3F: 400x300, B/W mode, LUT set by registers
    PanelSetting = 0x00,
    /// Internal/external power selection and VDH, VDL, VDHR levels, 5 data bytes
    PowerSetting = 0x01,
    /// Turns off charge pump, T-con, source/gate driver, VCOM and temperature sensor.
    /// Register content is kept until VDD goes off.
    PowerOff = 0x02,
    /// Setting Power OFF sequence
    PowerOffSequenceSetting = 0x03,
    /// Turning On the Power
    PowerOn = 0x04,
    /// Enables the internal bandgap, cleared by the next power off
    PowerOnMeasure = 0x05,
    /// Booster soft start, 3 data bytes
    BoosterSoftStart = 0x06,
    /// Enter deep-sleep. Only executed if the single check byte is `0xA5`,
    /// a hardware reset is the only way back.
    DeepSleep = 0x07,
    /// Write "OLD" data into SRAM (B/W mode)
    DataStartTransmission1 = 0x10,
    /// Stopping data transmission
    DataStop = 0x11,
    /// Refresh the display according to SRAM data and LUT.
    ///
    /// BUSY_N goes low while the refresh is running.
    DisplayRefresh = 0x12,
    /// Write "NEW" data into SRAM (B/W mode)
    DataStartTransmission2 = 0x13,
    /// VCOM LUT: 7 groups of 6 bytes plus 2 trailing bytes, byte 5 of a group is its repeat count
    LutForVcom = 0x20,
    /// White-to-White LUT: 7 groups of 6 bytes
    LutWhiteToWhite = 0x21,
    /// Black-to-White LUT: 7 groups of 6 bytes
    LutBlackToWhite = 0x22,
    /// White-to-Black LUT: 7 groups of 6 bytes
    LutWhiteToBlack = 0x23,
    /// Black-to-Black LUT: 7 groups of 6 bytes
    LutBlackToBlack = 0x24,
    /// PLL clock frequency, `0x3F & (M << 3 | N)`
    PllControl = 0x30,
    /// Reads the temperature sensed by the temperature sensor.
    TemperatureSensorCommand = 0x40,
    /// Selects the Internal or External temperature sensor and offset
    TemperatureSensorSelection = 0x41,
    /// Write External Temperature Sensor
    TemperatureSensorWrite = 0x42,
    /// Read External Temperature Sensor
    TemperatureSensorRead = 0x43,
    /// Interval of VCOM and data output, also selects the border behaviour
    VcomAndDataIntervalSetting = 0x50,
    /// Low power detection flag
    LowPowerDetection = 0x51,
    /// Non-overlap period of Gate and Source.
    TconSetting = 0x60,
    /// Resolution, width and height each as 2 bytes, high byte first
    ResolutionSetting = 0x61,
    /// First active gate and source
    GsstSetting = 0x65,
    /// Read Flags: PTL, I2C_ERR, I2C_BUSY, DATA, PON, POF, BUSY
    GetStatus = 0x71,
    /// Automatically measure VCOM
    AutoMeasurementVcom = 0x80,
    /// Read the VCOM value
    ReadVcomValue = 0x81,
    /// Set VCM_DC
    VcmDcSetting = 0x82,
    /// Partial window bounds, 9 data bytes
    PartialWindow = 0x90,
    /// Enter partial mode
    PartialIn = 0x91,
    /// Exit partial mode and enter normal mode
    PartialOut = 0x92,
    /// Enter program mode, check byte `0xA5`
    ProgramMode = 0xA0,
    /// Activate the programming state machine
    ActiveProgramming = 0xA1,
    /// Read OTP content
    ReadOtp = 0xA2,
    /// Power saving during refresh
    PowerSaving = 0xE3,
}

impl traits::Command for Command {
    /// Returns the address of the command
    fn address(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Command as CommandTrait;

    #[test]
    fn command_addr() {
        assert_eq!(Command::PowerSaving.address(), 0xE3);

        assert_eq!(Command::PanelSetting.address(), 0x00);

        assert_eq!(Command::DisplayRefresh.address(), 0x12);

        assert_eq!(Command::PartialWindow.address(), 0x90);
    }
}
