//! Refresh modes and the LUT sets they send
//!
//! Drawing with the quick LUT over and over again leaves ghosting behind. The
//! healthy quick mode therefore rotates between a weak drive, which skips the
//! white-to-white and black-to-black transitions, and a strong drive every
//! [`HEAVY_CYCLE_NR`] refreshes, which runs them once to flush residual charge.

use super::command::Command;
use super::constants::*;
use log::trace;

/// Seperates the different LUT for the Display Refresh process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshLut {
    /// The "normal" full Lookuptable for the Refresh-Sequence
    #[default]
    Full,
    /// The quick LUT where not the full refresh sequence is followed.
    /// This might lead to some ghosting
    Quick,
    /// The quick LUT with a periodic strong drive, see [`WeakCycleCounter`]
    QuickAndHealthy,
    /// The shade LUT for the given pass of the gray shade renderer
    Shades(u8),
}

/// Drive strength of a healthy quick refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveStrength {
    /// Runs the W2W and B2B rows once
    Strong,
    /// Skips the W2W and B2B rows
    Weak,
}

/// Repeat counts written into the first row of every LUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRepeats {
    /// VCOM table
    pub vcom: u8,
    /// White-to-white table
    pub ww: u8,
    /// Black-to-white table
    pub bw: u8,
    /// White-to-black table
    pub wb: u8,
    /// Black-to-black table
    pub bb: u8,
}

impl DriveStrength {
    /// Repeat counts of the first row in every table for this drive strength
    pub fn repeats(self) -> RowRepeats {
        match self {
            DriveStrength::Strong => RowRepeats {
                vcom: 1,
                ww: 1,
                bw: 2,
                wb: 2,
                bb: 1,
            },
            DriveStrength::Weak => RowRepeats {
                vcom: 1,
                ww: 0,
                bw: 2,
                wb: 2,
                bb: 0,
            },
        }
    }
}

/// Counts healthy quick refreshes modulo [`HEAVY_CYCLE_NR`]
///
/// A count of 0 means the next healthy refresh uses the strong drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeakCycleCounter(u8);

impl WeakCycleCounter {
    /// A counter whose next healthy refresh is a strong one
    pub const fn new() -> Self {
        WeakCycleCounter(0)
    }

    /// Current position in the cycle, always below [`HEAVY_CYCLE_NR`]
    pub fn count(&self) -> u8 {
        self.0
    }

    /// Restart the cycle, the next healthy refresh is a strong one
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Returns the drive strength for this refresh and moves on to the next one
    pub fn advance(&mut self) -> DriveStrength {
        let strength = if self.0 == 0 {
            DriveStrength::Strong
        } else {
            DriveStrength::Weak
        };
        self.0 = (self.0 + 1) % HEAVY_CYCLE_NR;
        strength
    }
}

/// Frame count of the first B2B shade row for a renderer pass
pub fn shade_frame_count(pass: u8) -> u8 {
    let count = 2 + (15 * u16::from(pass)) / u16::from(SHADES - 1);
    u8::try_from(count).unwrap_or(u8::MAX)
}

/// A resolved waveform: a [`RefreshLut`] with everything its overrides depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Waveform {
    Full,
    Quick,
    Healthy(DriveStrength),
    Shade(u8),
}

impl Waveform {
    /// Builds the five tables in the order the controller expects them
    pub(crate) fn tables(self) -> LutTables {
        trace!("building LUT set {:?}", self);
        match self {
            Waveform::Full => LutTables {
                vcom: LUT_VCOM0,
                ww: LUT_WW,
                bw: LUT_BW,
                wb: LUT_WB,
                bb: LUT_BB,
            },
            Waveform::Quick => LutTables::quick(),
            Waveform::Healthy(strength) => {
                let repeats = strength.repeats();
                let mut tables = LutTables::quick();
                tables.vcom[REPEAT_OFFSET] = repeats.vcom;
                tables.ww[REPEAT_OFFSET] = repeats.ww;
                tables.bw[REPEAT_OFFSET] = repeats.bw;
                tables.wb[REPEAT_OFFSET] = repeats.wb;
                tables.bb[REPEAT_OFFSET] = repeats.bb;
                tables
            }
            Waveform::Shade(pass) => {
                let mut tables = LutTables {
                    vcom: LUT_VCOM0_SHADE,
                    ww: LUT_WW_SHADE,
                    bw: LUT_BW_SHADE,
                    wb: LUT_WB_SHADE,
                    bb: LUT_BB_SHADE,
                };
                let frames = shade_frame_count(pass);
                for offset in SHADE_FRAME_OFFSETS {
                    tables.bb[offset] = frames;
                }
                tables
            }
        }
    }
}

/// Owned copy of one LUT set, ready to be transmitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LutTables {
    pub vcom: [u8; LUT_VCOM_LEN],
    pub ww: [u8; LUT_LEN],
    pub bw: [u8; LUT_LEN],
    pub wb: [u8; LUT_LEN],
    pub bb: [u8; LUT_LEN],
}

impl LutTables {
    fn quick() -> Self {
        LutTables {
            vcom: LUT_VCOM0_QUICK,
            ww: LUT_WW_QUICK,
            bw: LUT_BW_QUICK,
            wb: LUT_WB_QUICK,
            bb: LUT_BB_QUICK,
        }
    }

    /// The tables with their LUT commands: VCOM, WW, BW, WB, BB
    pub(crate) fn commands(&self) -> [(Command, &[u8]); 5] {
        [
            (Command::LutForVcom, &self.vcom[..]),
            (Command::LutWhiteToWhite, &self.ww[..]),
            (Command::LutBlackToWhite, &self.bw[..]),
            (Command::LutWhiteToBlack, &self.wb[..]),
            (Command::LutBlackToBlack, &self.bb[..]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_drive_every_heavy_cycle() {
        let mut counter = WeakCycleCounter::new();
        for call in 0..3 * u32::from(HEAVY_CYCLE_NR) {
            let expected = if call % u32::from(HEAVY_CYCLE_NR) == 0 {
                DriveStrength::Strong
            } else {
                DriveStrength::Weak
            };
            assert_eq!(counter.advance(), expected, "call {}", call + 1);
            assert!(counter.count() < HEAVY_CYCLE_NR);
        }
    }

    #[test]
    fn reset_restarts_cycle() {
        let mut counter = WeakCycleCounter::new();
        assert_eq!(counter.advance(), DriveStrength::Strong);
        assert_eq!(counter.advance(), DriveStrength::Weak);
        assert_eq!(counter.advance(), DriveStrength::Weak);
        counter.reset();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.advance(), DriveStrength::Strong);
        for _ in 1..HEAVY_CYCLE_NR {
            assert_eq!(counter.advance(), DriveStrength::Weak);
        }
        assert_eq!(counter.advance(), DriveStrength::Strong);
    }

    #[test]
    fn every_set_has_mandated_lengths() {
        let waveforms = [
            Waveform::Full,
            Waveform::Quick,
            Waveform::Healthy(DriveStrength::Strong),
            Waveform::Healthy(DriveStrength::Weak),
            Waveform::Shade(0),
            Waveform::Shade(SHADES - 2),
        ];
        for waveform in waveforms {
            let tables = waveform.tables();
            let lens: [usize; 5] = tables.commands().map(|(_, table)| table.len());
            assert_eq!(lens, [44, 42, 42, 42, 42]);
        }
    }

    #[test]
    fn healthy_only_touches_repeat_byte() {
        let quick = Waveform::Quick.tables();
        let weak = Waveform::Healthy(DriveStrength::Weak).tables();
        for ((_, q), (_, w)) in quick.commands().iter().zip(weak.commands().iter()) {
            for (idx, (a, b)) in q.iter().zip(w.iter()).enumerate() {
                if idx != REPEAT_OFFSET {
                    assert_eq!(a, b);
                }
            }
        }
        assert_eq!(weak.ww[REPEAT_OFFSET], 0);
        assert_eq!(weak.bb[REPEAT_OFFSET], 0);
        assert_eq!(weak.bw[REPEAT_OFFSET], 2);

        let strong = Waveform::Healthy(DriveStrength::Strong).tables();
        assert_eq!(strong.vcom[REPEAT_OFFSET], 1);
        assert_eq!(strong.ww[REPEAT_OFFSET], 1);
        assert_eq!(strong.bb[REPEAT_OFFSET], 1);
        assert_eq!(strong.wb[REPEAT_OFFSET], 2);
    }

    #[test]
    fn shade_frame_counts() {
        assert_eq!(shade_frame_count(0), 2);
        assert_eq!(shade_frame_count(1), 4);
        assert_eq!(shade_frame_count(6), 14);

        let tables = Waveform::Shade(3).tables();
        assert_eq!(&tables.bb[..3], &[0x50, 8, 8]);
        assert_eq!(tables.ww, LUT_WW_SHADE);
    }

    #[test]
    fn full_is_untouched() {
        let tables = Waveform::Full.tables();
        assert_eq!(tables.vcom, LUT_VCOM0);
        assert_eq!(tables.bb, LUT_BB);
    }
}
