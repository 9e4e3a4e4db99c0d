// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Target memory map and erase-region selection.

use bitflags::bitflags;

use crate::drivers::icsp::timing;

pub const FLASH_START: u32 = 0x00_0000;
pub const FLASH_END: u32 = 0x01_FFFF;
pub const FLASH_ROW_BYTES: usize = 128;
pub const FLASH_ROW_WORDS: usize = FLASH_ROW_BYTES / 2;

pub const USER_ID_START: u32 = 0x20_0000;
pub const USER_ID_END: u32 = 0x20_000F;

pub const CONFIG_START: u32 = 0x30_0000;
pub const CONFIG_END: u32 = 0x30_000F;

pub const EEPROM_START: u32 = 0x31_0000;
pub const EEPROM_END: u32 = 0x31_03FF;

pub const REVISION_ID_ADDR: u32 = 0x3F_FFFC;
pub const DEVICE_ID_ADDR: u32 = 0x3F_FFFE;

/// How a region's values sit in the 16-bit ICSP transfer unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Full 16-bit word, unpacked little-endian.
    Word,
    /// One byte in the low half of the word.
    ByteInWord,
}

/// An addressable class of target memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Region {
    Flash,
    Config,
    Eeprom,
    UserId,
}

impl Region {
    /// Address that selects this region for a bulk erase.
    pub const fn base(self) -> u32 {
        match self {
            Region::Flash => FLASH_START,
            Region::Config => CONFIG_START,
            Region::Eeprom => EEPROM_START,
            Region::UserId => USER_ID_START,
        }
    }

    pub const fn unit(self) -> Unit {
        match self {
            Region::Eeprom => Unit::ByteInWord,
            Region::Flash | Region::Config | Region::UserId => Unit::Word,
        }
    }

    /// Settle time after a bulk erase of this region.
    pub const fn erase_settle_ms(self) -> u32 {
        timing::BULK_ERASE_MS
    }

    /// Classify an address. Everything at or above the EEPROM base reads as EEPROM.
    pub fn containing(addr: u32) -> Region {
        match addr {
            a if a >= EEPROM_START => Region::Eeprom,
            CONFIG_START..=CONFIG_END => Region::Config,
            USER_ID_START..=USER_ID_END => Region::UserId,
            _ => Region::Flash,
        }
    }

    fn flag(self) -> Regions {
        match self {
            Region::Flash => Regions::FLASH,
            Region::Config => Regions::CONFIG,
            Region::Eeprom => Regions::EEPROM,
            Region::UserId => Regions::USER_ID,
        }
    }
}

bitflags! {
    /// Set of regions for a bulk erase.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct Regions: u8 {
        const EEPROM  = 1 << 0;
        const FLASH   = 1 << 1;
        const USER_ID = 1 << 2;
        const CONFIG  = 1 << 3;
    }
}

impl Regions {
    /// Config goes first: on a code-protected part its bulk erase is what clears the whole chip,
    /// and a flash erase issued before it does nothing.
    pub const ERASE_ORDER: [Region; 4] =
        [Region::Config, Region::Flash, Region::Eeprom, Region::UserId];

    /// The selected regions in mandatory erase order.
    pub fn in_erase_order(self) -> impl Iterator<Item = Region> {
        Self::ERASE_ORDER
            .into_iter()
            .filter(move |r| self.contains(r.flag()))
    }
}

impl From<Region> for Regions {
    fn from(region: Region) -> Self {
        region.flag()
    }
}
