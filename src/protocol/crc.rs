// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! CRC-8 used as the frame trailer: polynomial 0x07, initial value 0x00, MSB first, no final
//! XOR. This is the catalogued CRC-8/SMBUS algorithm.

use crc::{Crc, Digest, CRC_8_SMBUS};

pub static CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Running CRC-8 state, fed as frames stream in.
pub type Crc8Digest = Digest<'static, u8>;

/// CRC-8 of a complete buffer.
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}
