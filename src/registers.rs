/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Register addresses and bit layouts the bring-up sequence touches by name.

/// Registers addressed directly by the driver. Everything else lives only in
/// the configuration table as a raw address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum Register {
    Reset = 0x000,
    PowerDown = 0x002,
    ChipId = 0x003,
    SysrefMux = 0x139,
    SyncControl = 0x143,
    SyncDisable = 0x144,
    Pll2LockDetectMux = 0x16E,
    Pll1LockDetect = 0x182,
    Pll2LockDetect = 0x183,
}

impl Register {
    pub const fn addr(self) -> u16 {
        self as u16
    }
}

/// A single register poke: 13-bit address, 8-bit value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterWrite {
    pub address: u16,
    pub value: u8,
}

impl RegisterWrite {
    pub const fn new(address: u16, value: u8) -> Self {
        RegisterWrite { address, value }
    }

    pub const fn to(reg: Register, value: u8) -> Self {
        RegisterWrite::new(reg.addr(), value)
    }
}

bitflags! {
    /// 0x000
    pub struct ResetBits: u8 {
        const RESET = 0b1000_0000;
        const SPI_3WIRE_DIS = 0b0001_0000;
    }
}

bitflags! {
    /// 0x002
    pub struct PowerDownBits: u8 {
        const POWERDOWN = 0b0000_0001;
    }
}

bitflags! {
    /// 0x182 (PLL1) and 0x183 (PLL2) share this layout.
    pub struct LockDetectBits: u8 {
        const CLR_LD_LOST = 0b0000_0100;
        const DLD = 0b0000_0010;
        const LD_LOST = 0b0000_0001;
    }
}

bitflags! {
    /// 0x143
    pub struct SyncControlBits: u8 {
        const SYSREF_CLR = 0b1000_0000;
        const SYNC_1SHOT_EN = 0b0100_0000;
        const SYNC_POL = 0b0010_0000;
        const SYNC_EN = 0b0001_0000;
        const SYNC_PLL2_DLD = 0b0000_1000;
        const SYNC_PLL1_DLD = 0b0000_0100;
        const SYNC_MODE_MASK = 0b0000_0011;
        const SYNC_MODE_PIN = 0b0000_0001;
        const SYNC_MODE_PULSER = 0b0000_0010;
    }
}

bitflags! {
    /// 0x139
    pub struct SysrefMuxBits: u8 {
        const MUX_MASK = 0b0000_0011;
        const MUX_NORMAL_SYNC = 0b0000_0000;
        const MUX_RECLOCKED = 0b0000_0001;
        const MUX_PULSER = 0b0000_0010;
        const MUX_CONTINUOUS = 0b0000_0011;
    }
}

/// Low three bits of a lock-detect register when the PLL is locked and no
/// loss of lock has been latched since the sticky bit was last cleared.
pub const LOCKED_PATTERN: u8 = LockDetectBits::DLD.bits();
