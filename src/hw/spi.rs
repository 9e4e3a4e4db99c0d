// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ICSP clock and data lines on SPI1.
//!
//! - `IcspBus` wraps an enabled HAL SPI instance with 8-bit words and exposes it as an
//!   `embedded-hal` 1.0 bus.
//! - `PgdTurnaround` hands the shared PGD line to the target for reads by switching PA7 (MOSI)
//!   between input and its SPI alternate function. PA6 (MISO) stays on SPI and samples PGD.

use core::convert::Infallible;
use core::fmt;

use stm32f7xx_hal::{
    pac,
    prelude::*,
    spi::{self, Enabled, Spi},
};

use crate::drivers::icsp::DataLine;

/// Filler clocked out while the target drives PGD.
const READ_FILL: u8 = 0x00;

/// Any SPI peripheral fault (overrun, mode fault).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SPI peripheral fault")
    }
}

impl embedded_hal::spi::Error for BusFault {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

/// Blocking ICSP bus over an enabled HAL SPI instance.
pub struct IcspBus<I, P> {
    spi: Spi<I, P, Enabled<u8>>,
}

impl<I, P> IcspBus<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(spi: Spi<I, P, Enabled<u8>>) -> Self {
        Self { spi }
    }

    /// Perform a blocking, full-duplex transfer of one byte.
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, BusFault> {
        let mut tmp = [byte];
        self.spi.transfer(&mut tmp).map_err(|_| BusFault)?;
        Ok(tmp[0])
    }

    pub fn free(self) -> Spi<I, P, Enabled<u8>> {
        self.spi
    }
}

impl<I, P> embedded_hal::spi::ErrorType for IcspBus<I, P> {
    type Error = BusFault;
}

impl<I, P> embedded_hal::spi::SpiBus<u8> for IcspBus<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        for w in words.iter_mut() {
            *w = self.transfer_byte(READ_FILL)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), BusFault> {
        for &w in words {
            self.transfer_byte(w)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), BusFault> {
        let n = read.len().max(write.len());
        for i in 0..n {
            let rx = self.transfer_byte(write.get(i).copied().unwrap_or(READ_FILL))?;
            if let Some(r) = read.get_mut(i) {
                *r = rx;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        for w in words.iter_mut() {
            *w = self.transfer_byte(*w)?;
        }
        Ok(())
    }

    /// Every byte is transferred to completion, so nothing is ever left in flight.
    fn flush(&mut self) -> Result<(), BusFault> {
        Ok(())
    }
}

/// PGD direction control on PA7.
///
/// Owns no pin type: PA7 is moved into the SPI peripheral, and only its MODER field is touched.
pub struct PgdTurnaround {
    _private: (),
}

impl PgdTurnaround {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn gpioa() -> &'static pac::gpioa::RegisterBlock {
        // SAFETY: MODER7 is only written from here, and SPI1 owns no other MODER bits at runtime.
        unsafe { &*pac::GPIOA::ptr() }
    }
}

impl Default for PgdTurnaround {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLine for PgdTurnaround {
    type Error = Infallible;

    fn release(&mut self) -> Result<(), Infallible> {
        Self::gpioa().moder.modify(|_, w| w.moder7().input());
        Ok(())
    }

    fn drive(&mut self) -> Result<(), Infallible> {
        Self::gpioa().moder.modify(|_, w| w.moder7().alternate());
        Ok(())
    }
}
