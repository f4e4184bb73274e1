/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
/*!
A platform agnostic Rust bring-up driver for the [LMK04828], based on the
[`embedded-hal`] traits.

## The Device

The TI LMK04828 is a dual-loop jitter cleaner and clock distributor with
seven clock output pairs and JESD204B SYSREF generation.

The device has a 3- or 4-wire SPI interface with 8-bit registers behind
13-bit addresses.

## What the driver does

Constructing [`Lmk04828`] runs the whole bring-up before it returns:

1. reset, power-up and SDO readback routing,
2. identity check against [`CHIP_ID`],
3. the compiled-in register table for one fixed frequency plan, in order,
4. clearing of the sticky lock-detect bits,
5. a lock check of PLL1 then PLL2,
6. a SYNC edge followed by a one-shot SYSREF pulse.

Either every step succeeds and you get a driver, or you get an [`InitError`]
telling you which step failed and what the chip answered. There is no
half-initialized handle and no retry.

## Usage

Wrap the SPI peripheral and chip select (or bring your own [`RegisterBus`]):

```ignore
use lmk04828::{Config, LogSink, Lmk04828, SpiInterface};

let bus = SpiInterface::new(spi, cs);
let mut delay = initialize_delay();

let mut clock = Lmk04828::new(bus, &mut delay, LogSink, Config::default().with_slot("-B"))?;
assert!(clock.verify_chip_id()?);
```

Failures carry the observed bytes:

```ignore
use lmk04828::{Config, InitError, LogSink, Lmk04828, Pll};

match Lmk04828::new(bus, &mut delay, LogSink, Config::default()) {
    Ok(clock) => { /* locked and synced */ }
    Err(InitError::ChipNotFound { observed }) => { /* wiring or dead chip */ }
    Err(InitError::PllNotLocked { pll: Pll::Pll1, raw_status }) => { /* no reference */ }
    Err(err) => { /* bus fault or PLL2 */ }
}
```

[LMK04828]: https://www.ti.com/lit/ds/symlink/lmk04828.pdf
[`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
*/
#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate bitflags;
use embedded_hal as hal;

#[macro_use]
mod diagnostics;
mod bring_up;
mod bus;
pub mod registers;
pub mod table;

pub use crate::bring_up::{
    apply, Identity, State, Timing, CHIP_ID, LOCK_CLEAR_SETTLE_MS, POST_CONFIG_SETTLE_MS,
};
pub use crate::bus::{RegisterBus, SpiInterface, SpiInterfaceError};
pub use crate::diagnostics::{Diagnostics, Level, LogSink, NullSink};

use crate::bring_up::BringUp;
use crate::hal::blocking::delay::DelayMs;
use crate::registers::{LockDetectBits, Register, LOCKED_PATTERN};
use core::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Pll {
    Pll1,
    Pll2,
}

impl Pll {
    fn lock_detect_register(self) -> Register {
        match self {
            Pll::Pll1 => Register::Pll1LockDetect,
            Pll::Pll2 => Register::Pll2LockDetect,
        }
    }
}

impl fmt::Display for Pll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pll::Pll1 => f.write_str("PLL1"),
            Pll::Pll2 => f.write_str("PLL2"),
        }
    }
}

/// Snapshot of one PLL's lock-detect register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockStatus {
    pub pll: Pll,
    pub locked: bool,
    pub raw_status: u8,
}

impl LockStatus {
    pub fn from_raw(pll: Pll, raw_status: u8) -> Self {
        LockStatus {
            pll,
            locked: raw_status & LockDetectBits::all().bits() == LOCKED_PATTERN,
            raw_status,
        }
    }

    pub fn bits(&self) -> LockDetectBits {
        LockDetectBits::from_bits_truncate(self.raw_status)
    }
}

/// Why construction failed. The chip is in an unspecified state afterwards.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitError<E> {
    #[error("unable to locate LMK04828 (chip id {observed})")]
    ChipNotFound { observed: u8 },
    #[error("LMK {pll} did not lock (status {raw_status:#04x})")]
    PllNotLocked { pll: Pll, raw_status: u8 },
    #[error("register bus error: {0:?}")]
    Bus(E),
}

impl<E> From<E> for InitError<E> {
    fn from(err: E) -> Self {
        InitError::Bus(err)
    }
}

impl<E> InitError<E> {
    /// `true` when the chip answered but answered wrong, as opposed to the
    /// bus itself failing.
    pub fn is_hardware_fault(&self) -> bool {
        !matches!(self, InitError::Bus(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// Only used to tag diagnostics.
    pub slot: &'static str,
    pub timing: Timing,
}

impl Config {
    pub fn with_slot(mut self, slot: &'static str) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            slot: "-A",
            timing: Timing::DEFAULT,
        }
    }
}

/// A locked and synchronized LMK04828.
pub struct Lmk04828<B, G> {
    bus: B,
    diagnostics: G,
    slot: &'static str,
}

impl<B, G> Lmk04828<B, G>
where
    B: RegisterBus,
    G: Diagnostics,
{
    /// Brings the chip up and returns only once both PLLs are locked and the
    /// outputs have been synchronized.
    pub fn new<D: DelayMs<u32>>(
        mut bus: B,
        delay: &mut D,
        mut diagnostics: G,
        config: Config,
    ) -> Result<Self, InitError<B::Error>> {
        BringUp::new(
            &mut bus,
            delay,
            &mut diagnostics,
            config.slot,
            config.timing,
        )
        .run()?;

        Ok(Lmk04828 {
            bus,
            diagnostics,
            slot: config.slot,
        })
    }

    pub fn slot(&self) -> &'static str {
        self.slot
    }

    /// Raw read of the identity register.
    pub fn read_chip_id(&mut self) -> Result<u8, B::Error> {
        bring_up::read_chip_id(&mut self.bus, &mut self.diagnostics, self.slot)
    }

    /// Re-run the identity comparison, e.g. as a periodic health check.
    pub fn verify_chip_id(&mut self) -> Result<bool, B::Error> {
        bring_up::verify_identity(&mut self.bus, &mut self.diagnostics, self.slot)
            .map(|identity| identity.matches())
    }

    /// Current lock-detect state of one PLL. Read only; the sticky bits are
    /// left as they are.
    pub fn lock_status(&mut self, pll: Pll) -> Result<LockStatus, B::Error> {
        bring_up::read_lock_status(&mut self.bus, pll)
    }

    /// Give back the bus and the diagnostics sink.
    pub fn release(self) -> (B, G) {
        (self.bus, self.diagnostics)
    }
}
