// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Blocking delays on the SysTick timer.

use cortex_m::peripheral::SYST;
use stm32f7xx_hal::rcc::Clocks;

pub struct SysDelay {
    inner: cortex_m::delay::Delay,
}

impl SysDelay {
    pub fn new(syst: SYST, clocks: &Clocks) -> Self {
        Self {
            inner: cortex_m::delay::Delay::new(syst, clocks.sysclk().raw()),
        }
    }

    pub fn free(self) -> SYST {
        self.inner.free()
    }
}

impl embedded_hal::delay::DelayNs for SysDelay {
    /// Rounded up to whole microseconds.
    fn delay_ns(&mut self, ns: u32) {
        self.inner.delay_us(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.inner.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.inner.delay_ms(ms);
    }
}
