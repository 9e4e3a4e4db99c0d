// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART abstraction layer.
//!
//! - `Usart` is the transmit-only debug console the logger writes to.
//! - `HostLink` is the framed command link, exposed as a blocking `embedded-io` byte stream.
//!
//! To access either port on the host machine, connect to its USB-serial adapter and use
//! ```text
//! $ screen /dev/tty.usbmodem* <baud_rate>
//! ```
//!
//! To close the terminal, press `Ctrl+A` then `Ctrl+\` then `y`.

use core::fmt;
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{Instance, Pins, Rx, Serial, Tx},
};

/// Debug console, transmit only.
pub struct Usart<U: Instance> {
    tx: Tx<U>,
}

impl<U: Instance> Usart<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, _rx) = serial.split();
        Self { tx }
    }

    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        let _ = block!(self.tx.write(b));
    }

    pub fn write_str(&mut self, s: &str) {
        for &b in s.as_bytes() {
            self.write_byte(b);
        }
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    pub fn flush(&mut self) {
        let _ = block!(self.tx.flush());
    }
}

// Implement `core::fmt::Write` so we can use `write!` / `writeln!` on `Usart`.
impl<U: Instance> fmt::Write for Usart<U> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Usart::write_str(self, s);
        Ok(())
    }
}

/// Host link failures. Any of them aborts the frame in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Overrun, framing, noise or parity error on receive.
    Receive,
    Transmit,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Receive => f.write_str("host link receive error"),
            LinkError::Transmit => f.write_str("host link transmit error"),
        }
    }
}

impl embedded_io::Error for LinkError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// Full-duplex host link.
pub struct HostLink<U: Instance> {
    tx: Tx<U>,
    rx: Rx<U>,
}

impl<U: Instance> HostLink<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, rx) = serial.split();
        Self { tx, rx }
    }
}

impl<U: Instance> embedded_io::ErrorType for HostLink<U> {
    type Error = LinkError;
}

impl<U: Instance> embedded_io::Read for HostLink<U> {
    /// Blocks for the first byte, then returns whatever else has already arrived.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        if buf.is_empty() {
            return Ok(0);
        }
        buf[0] = block!(self.rx.read()).map_err(|_| LinkError::Receive)?;

        let mut n = 1;
        while n < buf.len() {
            match self.rx.read() {
                Ok(b) => {
                    buf[n] = b;
                    n += 1;
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => return Err(LinkError::Receive),
            }
        }
        Ok(n)
    }
}

impl<U: Instance> embedded_io::Write for HostLink<U> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError> {
        for &b in buf {
            block!(self.tx.write(b)).map_err(|_| LinkError::Transmit)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        block!(self.tx.flush()).map_err(|_| LinkError::Transmit)
    }
}
