// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board glue. Only [`led`] is hardware-agnostic; the rest binds the STM32F767 peripherals and
//! is built for the MCU target alone.

pub mod led;

#[cfg(target_os = "none")]
pub mod delay;
#[cfg(target_os = "none")]
pub mod gpio;
#[cfg(target_os = "none")]
pub mod logger;
#[cfg(target_os = "none")]
pub mod pins;
#[cfg(target_os = "none")]
pub mod spi;
#[cfg(target_os = "none")]
pub mod usart;

pub use led::Led;

#[cfg(target_os = "none")]
pub use {
    delay::SysDelay,
    gpio::Line,
    spi::{IcspBus, PgdTurnaround},
    usart::{HostLink, Usart},
};
