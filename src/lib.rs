// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # lvprog Firmware
//!
//! Firmware for a low-voltage ICSP programmer: an STM32F767 board that takes framed,
//! CRC-checked commands from a host over a serial link and carries them out on a PIC18
//! Q40/Q41/K42 target over its ICSP clock and data lines.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`protocol`] | Host frame codec, CRC-8, command and status tables |
//! | [`drivers`] | ICSP engine: session state, primitive and composite target operations |
//! | [`devices`] | Device-id to part name and flash size lookup |
//! | [`dispatch`] | Payload contracts and one handler per host command |
//! | [`bridge`] | Main loop tying the codec to the dispatcher |
//! | [`hw`] | MCU-level wrappers around USART, SPI, GPIO, SysTick and the logger |
//! | [`config`] | Baud rates, ICSP clock, version string, log level |
//!
//! ## Getting Started
//!
//! Run the unit tests on the host:
//!
//! ```bash
//! cargo test --lib
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod bridge;
pub mod config;
pub mod devices;
pub mod dispatch;
pub mod drivers;
pub mod hw;
pub mod protocol;

#[cfg(test)]
mod testing;

pub use bridge::Bridge;
pub use dispatch::Dispatcher;
pub use drivers::icsp::IcspEngine;
