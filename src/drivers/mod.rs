// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-specific drivers that sit above the raw `hw/` layer and below the
//! command dispatcher.
//!
//! ## Existing drivers
//!
//! - [`icsp`] – Microchip low-voltage ICSP for PIC18 Q40/Q41/K42 targets

pub mod icsp;

pub use icsp::IcspEngine;
