/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! The compiled-in register sequence for the fixed frequency plan.
//!
//! Phases are applied in the order they are listed here, and writes within a
//! phase in slice order. The chip reports no error when this order is broken:
//! it simply fails to lock or comes up miscalibrated, so nothing in here may be
//! sorted, deduplicated or batched.

use crate::registers::{
    PowerDownBits, Register, RegisterWrite, ResetBits, SyncControlBits, SysrefMuxBits,
};

/// A named, ordered group of register writes.
#[derive(Debug, Copy, Clone)]
pub struct ConfigPhase {
    pub name: &'static str,
    pub writes: &'static [RegisterWrite],
}

impl ConfigPhase {
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

const fn w(address: u16, value: u8) -> RegisterWrite {
    RegisterWrite::new(address, value)
}

/// SYNC_CTRL as left by the bulk configuration: SYNC pin mode, edge
/// sensitive, SYSREF cleared, one-shot enabled.
const SYNC_IDLE: u8 = SyncControlBits::SYSREF_CLR.bits()
    | SyncControlBits::SYNC_1SHOT_EN.bits()
    | SyncControlBits::SYNC_EN.bits()
    | SyncControlBits::SYNC_MODE_PIN.bits();

/// Reset, power-up and routing of the PLL2 lock-detect mux to SDO so the
/// identity register can be read back.
pub const RESET: ConfigPhase = ConfigPhase {
    name: "reset",
    writes: &[
        RegisterWrite::to(
            Register::Reset,
            ResetBits::RESET.bits() | ResetBits::SPI_3WIRE_DIS.bits(),
        ),
        RegisterWrite::to(Register::Reset, ResetBits::SPI_3WIRE_DIS.bits()),
        RegisterWrite::to(Register::PowerDown, PowerDownBits::empty().bits()),
        // PLL2_LD_MUX = SPI readback, PLL2_LD_TYPE = push-pull
        RegisterWrite::to(Register::Pll2LockDetectMux, 0x3B),
    ],
};

/// Divider, delay and format settings for the seven clock output pairs.
pub const CLKOUT: ConfigPhase = ConfigPhase {
    name: "clkout",
    writes: &[
        // DCLKout0 / SDCLKout1
        w(0x100, 0x6C),
        w(0x101, 0x55),
        w(0x103, 0x00),
        w(0x104, 0x20),
        w(0x105, 0x00),
        w(0x106, 0xF3),
        w(0x107, 0x05),
        // DCLKout2 / SDCLKout3
        w(0x108, 0x6C),
        w(0x109, 0x55),
        w(0x10B, 0x00),
        w(0x10C, 0x20),
        w(0x10D, 0x00),
        w(0x10E, 0xF1),
        w(0x10F, 0x05),
        // DCLKout4 / SDCLKout5
        w(0x110, 0x6C),
        w(0x111, 0x55),
        w(0x113, 0x00),
        w(0x114, 0x20),
        w(0x115, 0x00),
        w(0x116, 0xF1),
        w(0x117, 0x05),
        // DCLKout6 / SDCLKout7
        w(0x118, 0x6C),
        w(0x119, 0x55),
        w(0x11B, 0x00),
        w(0x11C, 0x20),
        w(0x11D, 0x00),
        w(0x11E, 0xF1),
        w(0x11F, 0x05),
        // DCLKout8 / SDCLKout9
        w(0x120, 0x78),
        w(0x121, 0x55),
        w(0x123, 0x00),
        w(0x124, 0x20),
        w(0x125, 0x00),
        w(0x126, 0xF3),
        w(0x127, 0x00),
        // DCLKout10 / SDCLKout11
        w(0x128, 0x6C),
        w(0x129, 0x55),
        w(0x12B, 0x00),
        w(0x12C, 0x20),
        w(0x12D, 0x00),
        w(0x12E, 0xF9),
        w(0x12F, 0x00),
        // DCLKout12 / SDCLKout13
        w(0x130, 0x6C),
        w(0x131, 0x55),
        w(0x133, 0x00),
        w(0x134, 0x20),
        w(0x135, 0x00),
        w(0x136, 0xF9),
        w(0x137, 0x00),
    ],
};

/// VCO mux, SYSREF divider/delay, feedback mux and SYNC routing.
pub const SYSREF: ConfigPhase = ConfigPhase {
    name: "sysref",
    writes: &[
        w(0x138, 0x10), // VCO_MUX = VCO1, OSCout off
        RegisterWrite::to(Register::SysrefMux, SysrefMuxBits::MUX_NORMAL_SYNC.bits()),
        w(0x13A, 0x01), // SYSREF_DIV[12:8]
        w(0x13B, 0xE0), // SYSREF_DIV[7:0]
        w(0x13C, 0x00), // SYSREF_DDLY[12:8]
        w(0x13D, 0x08), // SYSREF_DDLY[7:0], values below 8 are reserved
        w(0x13E, 0x00), // one pulse per request
        w(0x13F, 0x0B), // feedback mux: DCLKout6 into PLL1 N
        w(0x140, 0x00),
        w(0x141, 0x00), // dynamic digital delay off
        w(0x142, 0x00),
        RegisterWrite::to(Register::SyncControl, SYNC_IDLE),
        RegisterWrite::to(Register::SyncDisable, 0x00), // SYNC reaches every output
        w(0x145, 0x7F), // must always be 127
    ],
};

/// Reference inputs, holdover/DAC and the PLL1 dividers.
pub const PLL1: ConfigPhase = ConfigPhase {
    name: "pll1",
    writes: &[
        w(0x146, 0x08), // CLKin type and enables
        w(0x147, 0x0E), // CLKin1 selected manually, routed to PLL1
        w(0x148, 0x01), // CLKin_SEL0 input with pull-up
        w(0x149, 0x01), // CLKin_SEL1 input with pull-down
        w(0x14A, 0x02), // RESET pin input with pull-down
        w(0x14B, 0x01), // holdover, DAC manual mode
        w(0x14C, 0xF6),
        w(0x14D, 0x00),
        w(0x14E, 0x00),
        w(0x14F, 0x7F),
        w(0x150, 0x03),
        w(0x151, 0x02),
        w(0x152, 0x00),
        w(0x153, 0x00), // CLKin0_R[13:8]
        w(0x154, 0x0A), // CLKin0_R[7:0]
        w(0x155, 0x00), // CLKin1_R[13:8]
        w(0x156, 0x01), // CLKin1_R[7:0]
        w(0x157, 0x00), // CLKin2_R[13:8]
        w(0x158, 0x01), // CLKin2_R[7:0]
        w(0x159, 0x00), // PLL1_N[13:8]
        w(0x15A, 0x68), // PLL1_N[7:0]
        w(0x15B, 0xCF), // PLL1 PFD
        w(0x15C, 0x27), // PLL1_DLD_CNT[13:8]
        w(0x15D, 0x10), // PLL1_DLD_CNT[7:0]
        w(0x15E, 0x00), // PLL1 R/N delay
        w(0x15F, 0x13), // Status_LD1 = PLL2 lock detect, push-pull
    ],
};

/// PLL2 reference divider, prescaler and the normal-mode calibration values.
pub const PLL2_REFERENCE: ConfigPhase = ConfigPhase {
    name: "pll2-reference",
    writes: &[
        w(0x160, 0x00), // PLL2_R[11:8]
        w(0x161, 0x01), // PLL2_R[7:0]
        w(0x162, 0x24), // PLL2 prescaler, OSCin frequency range
        w(0x163, 0x00),
        w(0x164, 0x00),
        w(0x165, 0x0C),
    ],
};

/// Must land after 0x165 and before the PLL2 N divider (0x168) is written;
/// writing 0x168 starts the VCO calibration.
pub const CALIBRATION: ConfigPhase = ConfigPhase {
    name: "calibration",
    writes: &[w(0x171, 0xAA), w(0x172, 0x02), w(0x17C, 0x15), w(0x17D, 0x33)],
};

/// PLL2 N divider, phase detector, lock-detect count and loop filter.
pub const PLL2_FEEDBACK: ConfigPhase = ConfigPhase {
    name: "pll2-feedback",
    writes: &[
        w(0x166, 0x00), // PLL2_N[17:16]
        w(0x167, 0x00), // PLL2_N[15:8]
        w(0x168, 0x0C), // PLL2_N[7:0]
        w(0x169, 0x51), // PLL2 PFD
        w(0x16A, 0x00), // PLL2_DLD_CNT[13:8]
        w(0x16B, 0x10), // PLL2_DLD_CNT[7:0]
        w(0x16C, 0x00), // loop filter R = 200 ohm
        w(0x16D, 0x00), // loop filter C = 10 pF
        w(0x173, 0x00), // PLL2 and prescaler powered
    ],
};

/// Everything between the identity check and the first settle wait.
pub const BULK_CONFIGURATION: [ConfigPhase; 6] =
    [CLKOUT, SYSREF, PLL1, PLL2_REFERENCE, CALIBRATION, PLL2_FEEDBACK];

/// Set then clear the sticky lock-lost bit of each PLL.
pub const LOCK_CLEAR: ConfigPhase = ConfigPhase {
    name: "lock-clear",
    writes: &[
        RegisterWrite::to(Register::Pll1LockDetect, 0x01),
        RegisterWrite::to(Register::Pll1LockDetect, 0x00),
        RegisterWrite::to(Register::Pll2LockDetect, 0x01),
        RegisterWrite::to(Register::Pll2LockDetect, 0x00),
    ],
};

/// Flip SYNC_POL to produce one SYNC edge, then hand SYSREF over to the
/// pulser and fire it once.
pub const SYNC: ConfigPhase = ConfigPhase {
    name: "sync",
    writes: &[
        RegisterWrite::to(
            Register::SyncControl,
            SYNC_IDLE | SyncControlBits::SYNC_POL.bits(),
        ),
        RegisterWrite::to(Register::SyncControl, SYNC_IDLE),
        RegisterWrite::to(Register::SysrefMux, SysrefMuxBits::MUX_PULSER.bits()),
        RegisterWrite::to(Register::SyncDisable, 0xFF),
        RegisterWrite::to(
            Register::SyncControl,
            SyncControlBits::SYNC_1SHOT_EN.bits()
                | SyncControlBits::SYNC_EN.bits()
                | SyncControlBits::SYNC_MODE_PULSER.bits(),
        ),
    ],
};

/// Iterate the bulk configuration as one flat, ordered stream of writes.
pub fn bulk_writes() -> impl Iterator<Item = &'static RegisterWrite> {
    let phases: &'static [ConfigPhase] = &BULK_CONFIGURATION;
    phases.iter().flat_map(|phase| phase.writes.iter())
}
