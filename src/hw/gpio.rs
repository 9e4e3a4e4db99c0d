// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Push-pull output lines exposed through `embedded-hal` 1.0.

use core::convert::Infallible;

use stm32f7xx_hal::gpio::{self, Output, PinState, PushPull};

/// Any GPIO pin, configured push-pull and driven to a known level at construction.
pub struct Line<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> Line<P, N> {
    pub fn new(mut pin: gpio::Pin<P, N, Output<PushPull>>, initial: PinState) -> Self {
        pin.set_state(initial);
        Self { pin }
    }

    pub fn free(self) -> gpio::Pin<P, N, Output<PushPull>> {
        self.pin
    }
}

impl<const P: char, const N: u8> embedded_hal::digital::ErrorType for Line<P, N> {
    type Error = Infallible;
}

impl<const P: char, const N: u8> embedded_hal::digital::OutputPin for Line<P, N> {
    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.pin.set_low();
        Ok(())
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.pin.set_high();
        Ok(())
    }
}
