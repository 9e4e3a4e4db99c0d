// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Request payload contracts.
//!
//! ```text
//! WRITE_PAGE            [ADDR:4 LE] [DATA:128]
//! WRITE_CONFIG/EEPROM   [ADDR:4 LE] [LEN:2 LE] [DATA:LEN]
//! READ                  [ADDR:4 LE] [LEN:2 LE]
//! ```
//!
//! Trailing bytes past a contract are ignored.

use core::fmt;

use crate::drivers::icsp::region::{FLASH_ROW_BYTES, FLASH_ROW_WORDS};
use crate::protocol::MAX_PAYLOAD;

const ADDR_LEN: usize = 4;
const BLOCK_HEADER_LEN: usize = ADDR_LEN + 2;
const PAGE_LEN: usize = ADDR_LEN + FLASH_ROW_BYTES;

/// A payload that does not satisfy its command's contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Fewer bytes than the fixed part of the contract.
    TooShort { needed: usize, got: usize },
    /// Embedded length field claims more data than the frame carries.
    LengthMismatch { declared: usize, available: usize },
    /// Requested read larger than a response can carry.
    TooLong { requested: usize, max: usize },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PayloadError::TooShort { needed, got } => {
                write!(f, "payload too short: need {needed} bytes, got {got}")
            }
            PayloadError::LengthMismatch {
                declared,
                available,
            } => write!(f, "declared {declared} data bytes, only {available} present"),
            PayloadError::TooLong { requested, max } => {
                write!(f, "requested {requested} bytes, limit is {max}")
            }
        }
    }
}

/// One flash row addressed by a `WRITE_PAGE` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub addr: u32,
    pub words: [u16; FLASH_ROW_WORDS],
}

/// Address plus length-prefixed data, as carried by `WRITE_CONFIG` and `WRITE_EEPROM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub addr: u32,
    pub data: &'a [u8],
}

/// Address and byte count of a `READ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRange {
    pub addr: u32,
    pub len: usize,
}

fn need(payload: &[u8], needed: usize) -> Result<(), PayloadError> {
    if payload.len() < needed {
        Err(PayloadError::TooShort {
            needed,
            got: payload.len(),
        })
    } else {
        Ok(())
    }
}

/// Little-endian u32 at the start of `p`. Caller checks the length.
#[inline]
fn u32_le(p: &[u8]) -> u32 {
    u32::from_le_bytes([p[0], p[1], p[2], p[3]])
}

#[inline]
fn u16_le(p: &[u8]) -> u16 {
    u16::from_le_bytes([p[0], p[1]])
}

pub fn parse_page(payload: &[u8]) -> Result<Page, PayloadError> {
    need(payload, PAGE_LEN)?;

    let mut words = [0u16; FLASH_ROW_WORDS];
    for (w, pair) in words
        .iter_mut()
        .zip(payload[ADDR_LEN..PAGE_LEN].chunks_exact(2))
    {
        *w = u16_le(pair);
    }
    Ok(Page {
        addr: u32_le(payload),
        words,
    })
}

pub fn parse_block(payload: &[u8]) -> Result<Block<'_>, PayloadError> {
    need(payload, BLOCK_HEADER_LEN)?;

    let declared = usize::from(u16_le(&payload[ADDR_LEN..]));
    let available = payload.len() - BLOCK_HEADER_LEN;
    if declared > available {
        return Err(PayloadError::LengthMismatch {
            declared,
            available,
        });
    }
    Ok(Block {
        addr: u32_le(payload),
        data: &payload[BLOCK_HEADER_LEN..BLOCK_HEADER_LEN + declared],
    })
}

pub fn parse_read(payload: &[u8]) -> Result<ReadRange, PayloadError> {
    need(payload, BLOCK_HEADER_LEN)?;

    let len = usize::from(u16_le(&payload[ADDR_LEN..]));
    if len > MAX_PAYLOAD {
        return Err(PayloadError::TooLong {
            requested: len,
            max: MAX_PAYLOAD,
        });
    }
    Ok(ReadRange {
        addr: u32_le(payload),
        len,
    })
}
