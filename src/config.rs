// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Build-time configuration.

use log::LevelFilter;

/// Host link (ST-LINK virtual COM port).
pub const HOST_BAUD: u32 = 115_200;

/// Debug console carrying log output.
pub const DEBUG_BAUD: u32 = 115_200;

/// ICSP clock. The target accepts up to 10 MHz in LVP mode.
pub const ICSP_SPI_HZ: u32 = 5_000_000;

/// Reported by the `VERSION` command.
pub const VERSION: &str = concat!("lvprog ", env!("CARGO_PKG_VERSION"));

#[cfg(feature = "verbose")]
pub const LOG_LEVEL: LevelFilter = LevelFilter::Trace;
#[cfg(not(feature = "verbose"))]
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;
