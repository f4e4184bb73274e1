/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! The power-on to locked-and-synced sequence.

use crate::bus::RegisterBus;
use crate::diagnostics::Diagnostics;
use crate::hal::blocking::delay::DelayMs;
use crate::registers::{Register, RegisterWrite};
use crate::table;
use crate::{InitError, LockStatus, Pll};

/// Expected content of the identity register (0x003).
pub const CHIP_ID: u8 = 6;

/// Wait after the bulk configuration before touching the lock detectors.
pub const POST_CONFIG_SETTLE_MS: u32 = 100;

/// Wait between clearing the sticky lock bits and reading them back.
pub const LOCK_CLEAR_SETTLE_MS: u32 = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timing {
    pub post_config_settle_ms: u32,
    pub lock_clear_settle_ms: u32,
}

impl Timing {
    pub const DEFAULT: Timing = Timing {
        post_config_settle_ms: POST_CONFIG_SETTLE_MS,
        lock_clear_settle_ms: LOCK_CLEAR_SETTLE_MS,
    };

    /// No waiting at all, for simulated buses.
    pub const ZERO: Timing = Timing {
        post_config_settle_ms: 0,
        lock_clear_settle_ms: 0,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Timing::DEFAULT
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Reset,
    IdentityCheck,
    BulkConfiguration,
    LockClear,
    LockCheck,
    SyncPulse,
    Ready,
    Failed,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Ready | State::Failed)
    }
}

/// Result of one identity register read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Identity {
    pub observed: u8,
}

impl Identity {
    pub fn matches(&self) -> bool {
        self.observed == CHIP_ID
    }
}

/// Issue every write in order. Only a bus fault stops the batch early.
pub fn apply<B: RegisterBus>(bus: &mut B, writes: &[RegisterWrite]) -> Result<(), B::Error> {
    for write in writes {
        bus.write(write.address, write.value)?;
    }
    Ok(())
}

pub(crate) fn read_chip_id<B, G>(bus: &mut B, diag: &mut G, slot: &str) -> Result<u8, B::Error>
where
    B: RegisterBus,
    G: Diagnostics,
{
    let chip_id = bus.read(Register::ChipId.addr())?;
    diag!(diag, Trace, slot, "Read chip ID: {}", chip_id);
    Ok(chip_id)
}

/// Read the identity register and compare it against [`CHIP_ID`]. A mismatch
/// is reported, not raised; the caller decides whether it is fatal.
pub(crate) fn verify_identity<B, G>(
    bus: &mut B,
    diag: &mut G,
    slot: &str,
) -> Result<Identity, B::Error>
where
    B: RegisterBus,
    G: Diagnostics,
{
    let identity = Identity {
        observed: read_chip_id(bus, diag, slot)?,
    };
    if !identity.matches() {
        diag!(diag, Error, slot, "wrong chip id {}", identity.observed);
    }
    Ok(identity)
}

pub(crate) fn read_lock_status<B: RegisterBus>(
    bus: &mut B,
    pll: Pll,
) -> Result<LockStatus, B::Error> {
    let raw_status = bus.read(pll.lock_detect_register().addr())?;
    Ok(LockStatus::from_raw(pll, raw_status))
}

pub(crate) struct BringUp<'a, B, D, G> {
    bus: &'a mut B,
    delay: &'a mut D,
    diag: &'a mut G,
    slot: &'a str,
    timing: Timing,
    state: State,
}

impl<'a, B, D, G> BringUp<'a, B, D, G>
where
    B: RegisterBus,
    D: DelayMs<u32>,
    G: Diagnostics,
{
    pub fn new(
        bus: &'a mut B,
        delay: &'a mut D,
        diag: &'a mut G,
        slot: &'a str,
        timing: Timing,
    ) -> Self {
        BringUp {
            bus,
            delay,
            diag,
            slot,
            timing,
            state: State::Reset,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Drive the chip to [`State::Ready`] or fail. Never resumes a failed run.
    pub fn run(mut self) -> Result<(), InitError<B::Error>> {
        while !self.state.is_terminal() {
            self.advance()?;
        }
        Ok(())
    }

    /// Execute the current state and move to the next one.
    pub fn advance(&mut self) -> Result<State, InitError<B::Error>> {
        match self.step() {
            Ok(next) => {
                self.state = next;
                Ok(next)
            }
            Err(err) => {
                self.state = State::Failed;
                Err(err)
            }
        }
    }

    fn step(&mut self) -> Result<State, InitError<B::Error>> {
        let slot = self.slot;
        match self.state {
            State::Reset => {
                diag!(self.diag, Info, slot, "Init LMK");
                apply(self.bus, table::RESET.writes)?;
                Ok(State::IdentityCheck)
            }
            State::IdentityCheck => {
                let identity = verify_identity(self.bus, self.diag, slot)?;
                if identity.matches() {
                    Ok(State::BulkConfiguration)
                } else {
                    diag!(self.diag, Error, slot, "Unable to locate LMK04828");
                    Err(InitError::ChipNotFound {
                        observed: identity.observed,
                    })
                }
            }
            State::BulkConfiguration => {
                diag!(self.diag, Trace, slot, "Setting clkout config...");
                for phase in table::BULK_CONFIGURATION.iter() {
                    apply(self.bus, phase.writes)?;
                }
                self.delay.delay_ms(self.timing.post_config_settle_ms);
                Ok(State::LockClear)
            }
            State::LockClear => {
                apply(self.bus, table::LOCK_CLEAR.writes)?;
                self.delay.delay_ms(self.timing.lock_clear_settle_ms);
                Ok(State::LockCheck)
            }
            State::LockCheck => {
                diag!(self.diag, Trace, slot, "Checking PLL lock bits...");
                for &pll in [Pll::Pll1, Pll::Pll2].iter() {
                    let status = read_lock_status(self.bus, pll)?;
                    if !status.locked {
                        diag!(
                            self.diag,
                            Error,
                            slot,
                            "LMK {} did not lock. Status: {:x}",
                            pll,
                            status.raw_status
                        );
                        return Err(InitError::PllNotLocked {
                            pll,
                            raw_status: status.raw_status,
                        });
                    }
                }
                Ok(State::SyncPulse)
            }
            State::SyncPulse => {
                diag!(self.diag, Trace, slot, "Setting SYNC and SYSREF config...");
                apply(self.bus, table::SYNC.writes)?;
                diag!(self.diag, Info, slot, "LMK init'd and locked!");
                Ok(State::Ready)
            }
            State::Ready | State::Failed => Ok(self.state),
        }
    }
}
