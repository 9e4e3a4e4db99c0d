// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Low-voltage ICSP driver for PIC18 Q/K42-family targets.
//!
//! Commands are an 8-bit opcode, optionally followed by a 24-bit field carrying a 22-bit address
//! or a 16-bit data word, shifted left by one with a start and stop bit around it:
//!
//! ```text
//! [opcode] [(v >> 15) & 0xFF] [(v >> 7) & 0xFF] [(v << 1) & 0xFF]
//! ```
//!
//! Reads come back in the same layout after the host stops driving PGD.

use core::fmt;

use embedded_hal::spi::ErrorKind;

pub mod engine;
pub mod region;

pub use engine::{IcspEngine, Session};
pub use region::{Region, Regions, Unit};

/// ICSP opcodes
pub mod opcode {
    pub const LOAD_PC: u8 = 0x80;
    pub const BULK_ERASE: u8 = 0x18;
    pub const PAGE_ERASE: u8 = 0xF0;
    pub const READ_DATA: u8 = 0xFC;
    pub const READ_DATA_INC: u8 = 0xFE;
    pub const INCREMENT_ADDRESS: u8 = 0xF8;
    pub const LOAD_DATA: u8 = 0x00;
    pub const LOAD_DATA_INC: u8 = 0x02;
    pub const BEGIN_PROGRAM: u8 = 0xE0;
}

/// Delays from the target's programming datasheet.
pub mod timing {
    /// MCLR low before the key is clocked in.
    pub const MCLR_SETTLE_MS: u32 = 50;
    /// After the key, before the first command.
    pub const KEY_SETTLE_MS: u32 = 5;
    /// MCLR released before the target runs.
    pub const EXIT_SETTLE_MS: u32 = 5;
    pub const BULK_ERASE_MS: u32 = 26;
    pub const PAGE_ERASE_MS: u32 = 11;
    /// Internally timed single-word program.
    pub const WORD_PROGRAM_US: u32 = 75;
    /// One begin-program pulse for a buffered 64-word row.
    pub const ROW_PROGRAM_MS: u32 = 3;
    pub const EEPROM_BYTE_MS: u32 = 11;
    pub const CONFIG_WORD_MS: u32 = 11;
    /// Between loading the id address and reading it back.
    pub const ID_SETTLE_US: u32 = 1;
}

/// Key clocked in after MCLR goes low to enable low-voltage programming.
pub const LVP_KEY: [u8; 4] = *b"MCHP";

/// Half-duplex turnaround on the shared PGD line.
///
/// The SPI peripheral drives PGD for commands. Before the target answers a read the host must
/// stop driving it, and start again once the reply is clocked in.
pub trait DataLine {
    type Error: fmt::Debug;

    /// Stop driving PGD so the target can answer.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Drive PGD from the SPI output again.
    fn drive(&mut self) -> Result<(), Self::Error>;
}

/// ICSP driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// SPI transfer failed.
    Bus(ErrorKind),
    /// MCLR could not be driven.
    Pin,
    /// PGD turnaround failed.
    DataLine,
    /// Operation issued outside a program session.
    SessionInactive,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bus(kind) => write!(f, "ICSP bus error: {kind:?}"),
            Error::Pin => f.write_str("MCLR line error"),
            Error::DataLine => f.write_str("PGD turnaround error"),
            Error::SessionInactive => f.write_str("target is not in a program session"),
        }
    }
}

/// Pack a 22-bit address or 16-bit word into the 3-byte command field.
#[inline]
pub fn pack_field(value: u32) -> [u8; 3] {
    [
        ((value >> 15) & 0xFF) as u8,
        ((value >> 7) & 0xFF) as u8,
        ((value << 1) & 0xFF) as u8,
    ]
}

/// Reassemble a 16-bit word clocked in from the target.
#[inline]
pub fn unpack_word(raw: [u8; 3]) -> u16 {
    (u16::from(raw[0]) << 15) | (u16::from(raw[1]) << 7) | (u16::from(raw[2]) >> 1)
}
