/*
   Copyright 2018 Ilya Epifanov

   Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
   http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
   http://opensource.org/licenses/MIT>, at your option. This file may not be
   copied, modified, or distributed except according to those terms.
*/
//! Register access: the [`RegisterBus`] seam and an SPI implementation of it.

use crate::hal::blocking::spi::{Transfer, Write};
use crate::hal::digital::v2::OutputPin;

/// Byte-wide register access to one chip.
///
/// Calls must reach the chip in the order they are made.
pub trait RegisterBus {
    type Error;

    fn write(&mut self, address: u16, value: u8) -> Result<(), Self::Error>;
    fn read(&mut self, address: u16) -> Result<u8, Self::Error>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    type Error = B::Error;

    fn write(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
        (**self).write(address, value)
    }

    fn read(&mut self, address: u16) -> Result<u8, Self::Error> {
        (**self).read(address)
    }
}

const READ_BIT: u8 = 0b1000_0000;
const MAX_ADDRESS: u16 = 0x1FFF;

#[derive(Debug, PartialEq, Eq)]
pub enum SpiInterfaceError<S, P> {
    Spi(S),
    ChipSelect(P),
    /// Address does not fit the 13-bit field of the instruction word.
    Address(u16),
}

/// 4-wire SPI access using the 24-bit LMK0482x instruction word:
/// `R/W | W1 W0 | A12..A0 | D7..D0`.
///
/// Readback arrives on SDO only after the reset phase has routed the PLL2
/// lock-detect mux there (register 0x16E).
pub struct SpiInterface<SPI, CS> {
    spi: SPI,
    chip_select: CS,
}

impl<SPI, CS> SpiInterface<SPI, CS> {
    pub fn new(spi: SPI, chip_select: CS) -> Self {
        SpiInterface { spi, chip_select }
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.chip_select)
    }
}

impl<SPI, CS, E, P> SpiInterface<SPI, CS>
where
    SPI: Transfer<u8, Error = E> + Write<u8, Error = E>,
    CS: OutputPin<Error = P>,
{
    fn header(address: u16, read: bool) -> Result<[u8; 2], SpiInterfaceError<E, P>> {
        if address > MAX_ADDRESS {
            return Err(SpiInterfaceError::Address(address));
        }
        let rw = if read { READ_BIT } else { 0 };
        Ok([rw | (address >> 8) as u8, address as u8])
    }

    fn framed<T, F>(&mut self, f: F) -> Result<T, SpiInterfaceError<E, P>>
    where
        F: FnOnce(&mut SPI) -> Result<T, E>,
    {
        self.chip_select
            .set_low()
            .map_err(SpiInterfaceError::ChipSelect)?;
        let result = f(&mut self.spi).map_err(SpiInterfaceError::Spi);
        self.chip_select
            .set_high()
            .map_err(SpiInterfaceError::ChipSelect)?;
        result
    }
}

impl<SPI, CS, E, P> RegisterBus for SpiInterface<SPI, CS>
where
    SPI: Transfer<u8, Error = E> + Write<u8, Error = E>,
    CS: OutputPin<Error = P>,
{
    type Error = SpiInterfaceError<E, P>;

    fn write(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
        let [hi, lo] = Self::header(address, false)?;
        self.framed(|spi| <SPI as Write<u8>>::write(spi, &[hi, lo, value]))
    }

    fn read(&mut self, address: u16) -> Result<u8, Self::Error> {
        let [hi, lo] = Self::header(address, true)?;
        self.framed(|spi| {
            let mut frame = [hi, lo, 0];
            let rx = <SPI as Transfer<u8>>::transfer(spi, &mut frame)?;
            Ok(rx[2])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Debug, PartialEq)]
    enum Event {
        Low,
        High,
        Write(Vec<u8>),
        Transfer(Vec<u8>),
    }

    #[derive(Default)]
    struct Wire {
        events: Vec<Event>,
        readback: u8,
        fail_spi: bool,
    }

    struct MockSpi<'a>(&'a core::cell::RefCell<Wire>);
    struct MockPin<'a>(&'a core::cell::RefCell<Wire>);

    impl Write<u8> for MockSpi<'_> {
        type Error = ();

        fn write(&mut self, words: &[u8]) -> Result<(), ()> {
            let mut wire = self.0.borrow_mut();
            if wire.fail_spi {
                return Err(());
            }
            wire.events.push(Event::Write(words.to_vec()));
            Ok(())
        }
    }

    impl Transfer<u8> for MockSpi<'_> {
        type Error = ();

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
            let mut wire = self.0.borrow_mut();
            if wire.fail_spi {
                return Err(());
            }
            wire.events.push(Event::Transfer(words.to_vec()));
            let last = words.len() - 1;
            words[last] = wire.readback;
            Ok(words)
        }
    }

    impl OutputPin for MockPin<'_> {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().events.push(Event::Low);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().events.push(Event::High);
            Ok(())
        }
    }

    #[test]
    fn write_frame_layout() {
        let wire = core::cell::RefCell::new(Wire::default());
        let mut bus = SpiInterface::new(MockSpi(&wire), MockPin(&wire));
        bus.write(0x16E, 0x3B).unwrap();
        assert_eq!(
            wire.borrow().events,
            [Event::Low, Event::Write(vec![0x01, 0x6E, 0x3B]), Event::High]
        );
    }

    #[test]
    fn read_sets_rw_bit_and_returns_last_byte() {
        let wire = core::cell::RefCell::new(Wire {
            readback: 6,
            ..Wire::default()
        });
        let mut bus = SpiInterface::new(MockSpi(&wire), MockPin(&wire));
        assert_eq!(bus.read(0x003).unwrap(), 6);
        assert_eq!(
            wire.borrow().events,
            [Event::Low, Event::Transfer(vec![0x80, 0x03, 0x00]), Event::High]
        );
    }

    #[test]
    fn out_of_range_address_never_touches_the_wire() {
        let wire = core::cell::RefCell::new(Wire::default());
        let mut bus = SpiInterface::new(MockSpi(&wire), MockPin(&wire));
        assert_eq!(
            bus.write(0x2000, 0x00),
            Err(SpiInterfaceError::Address(0x2000))
        );
        assert!(wire.borrow().events.is_empty());
    }

    #[test]
    fn chip_select_released_after_spi_fault() {
        let wire = core::cell::RefCell::new(Wire {
            fail_spi: true,
            ..Wire::default()
        });
        let mut bus = SpiInterface::new(MockSpi(&wire), MockPin(&wire));
        assert_eq!(bus.read(0x182), Err(SpiInterfaceError::Spi(())));
        assert_eq!(wire.borrow().events, [Event::Low, Event::High]);
    }
}
