/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Leveled diagnostics, handed to the driver instead of a global logger.

use core::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Error,
    Info,
    Trace,
}

/// Receives every message the driver emits, tagged with the slot label.
pub trait Diagnostics {
    fn log(&mut self, level: Level, slot: &str, args: fmt::Arguments<'_>);
}

impl<G: Diagnostics + ?Sized> Diagnostics for &mut G {
    fn log(&mut self, level: Level, slot: &str, args: fmt::Arguments<'_>) {
        (**self).log(level, slot, args)
    }
}

/// Forwards to the [`log`](https://docs.rs/log) facade under the
/// `lmk04828` target.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl Diagnostics for LogSink {
    fn log(&mut self, level: Level, slot: &str, args: fmt::Arguments<'_>) {
        let level = match level {
            Level::Error => log::Level::Error,
            Level::Info => log::Level::Info,
            Level::Trace => log::Level::Trace,
        };
        log::log!(target: "lmk04828", level, "LMK04828{}: {}", slot, args);
    }
}

/// Drops everything.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullSink;

impl Diagnostics for NullSink {
    fn log(&mut self, _level: Level, _slot: &str, _args: fmt::Arguments<'_>) {}
}

macro_rules! diag {
    ($sink:expr, $level:ident, $slot:expr, $($arg:tt)*) => {
        {
            use $crate::diagnostics::Diagnostics as _;
            $sink.log(
                $crate::diagnostics::Level::$level,
                $slot,
                format_args!($($arg)*),
            )
        }
    };
}
