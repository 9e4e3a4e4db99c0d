// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! ICSP session owner.
//!
//! `IcspEngine` owns the SPI bus, the PGD turnaround, MCLR and the delay source, plus the program
//! session flag. Every operation other than [`enter`](IcspEngine::enter) and
//! [`exit`](IcspEngine::exit) fails with [`Error::SessionInactive`] while the target is idle.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Error as _, SpiBus};
use log::{debug, trace};

use crate::drivers::icsp::region::{
    Region, Regions, Unit, DEVICE_ID_ADDR, FLASH_ROW_WORDS, REVISION_ID_ADDR,
};
use crate::drivers::icsp::{opcode, pack_field, timing, unpack_word, DataLine, Error, LVP_KEY};

/// Program-mode session state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Session {
    Idle,
    ProgramActive,
}

pub struct IcspEngine<SPI, DAT, MCLR, D> {
    spi: SPI,
    dat: DAT,
    mclr: MCLR,
    delay: D,
    session: Session,
}

impl<SPI, DAT, MCLR, D> IcspEngine<SPI, DAT, MCLR, D>
where
    SPI: SpiBus,
    DAT: DataLine,
    MCLR: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the ICSP lines and release MCLR so the target runs.
    pub fn new(spi: SPI, dat: DAT, mut mclr: MCLR, delay: D) -> Self {
        mclr.set_high().ok();
        Self {
            spi,
            dat,
            mclr,
            delay,
            session: Session::Idle,
        }
    }

    #[inline]
    pub fn session(&self) -> Session {
        self.session
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.session == Session::ProgramActive
    }

    /// Hold MCLR low and clock in the LVP key. No-op if already in a session.
    pub fn enter(&mut self) -> Result<(), Error> {
        if self.is_active() {
            return Ok(());
        }
        debug!("entering program session");

        self.mclr.set_low().map_err(|_| Error::Pin)?;
        self.delay.delay_ms(timing::MCLR_SETTLE_MS);
        self.transmit(&LVP_KEY)?;
        self.delay.delay_ms(timing::KEY_SETTLE_MS);

        self.session = Session::ProgramActive;
        Ok(())
    }

    /// Release MCLR. No-op if already idle.
    pub fn exit(&mut self) -> Result<(), Error> {
        if !self.is_active() {
            return Ok(());
        }
        debug!("leaving program session");

        self.mclr.set_high().map_err(|_| Error::Pin)?;
        self.delay.delay_ms(timing::EXIT_SETTLE_MS);

        self.session = Session::Idle;
        Ok(())
    }

    /// Blocking wait on the engine's delay source.
    #[inline]
    pub fn wait_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    // ----- Primitive operations -----

    /// Load the target's program counter.
    pub fn load_address(&mut self, addr: u32) -> Result<(), Error> {
        trace!("load pc {:#08x}", addr);
        self.command_with(opcode::LOAD_PC, addr)
    }

    /// Bulk-erase one region. The region is selected by the loaded address.
    pub fn bulk_erase_region(&mut self, region: Region) -> Result<(), Error> {
        debug!("bulk erase {:?}", region);
        self.load_address(region.base())?;
        self.command(opcode::BULK_ERASE)?;
        self.delay.delay_ms(region.erase_settle_ms());
        Ok(())
    }

    /// Bulk-erase every selected region in the fixed Config, Flash, EEPROM, UserID order.
    pub fn bulk_erase(&mut self, regions: Regions) -> Result<(), Error> {
        self.ensure_active()?;
        for region in regions.in_erase_order() {
            self.bulk_erase_region(region)?;
        }
        Ok(())
    }

    /// Erase the page at the loaded address.
    pub fn erase_page(&mut self) -> Result<(), Error> {
        self.command(opcode::PAGE_ERASE)?;
        self.delay.delay_ms(timing::PAGE_ERASE_MS);
        Ok(())
    }

    /// Read the word at the loaded address, optionally advancing the program counter.
    pub fn read_word(&mut self, increment: bool) -> Result<u16, Error> {
        let op = if increment {
            opcode::READ_DATA_INC
        } else {
            opcode::READ_DATA
        };
        self.command(op)?;

        self.dat.release().map_err(|_| Error::DataLine)?;
        let mut raw = [0u8; 3];
        let read = self.spi.read(&mut raw).and_then(|_| self.spi.flush());
        // Take PGD back even if the transfer failed. A bus fault outranks a turnaround fault.
        let restored = self.dat.drive();
        read.map_err(|e| Error::Bus(e.kind()))?;
        restored.map_err(|_| Error::DataLine)?;

        let word = unpack_word(raw);
        trace!("read {:#06x}", word);
        Ok(word)
    }

    /// Latch one word and program it with a single internally timed pulse.
    pub fn write_word(&mut self, value: u16, increment: bool) -> Result<(), Error> {
        let op = if increment {
            opcode::LOAD_DATA_INC
        } else {
            opcode::LOAD_DATA
        };
        self.command_with(op, u32::from(value))?;
        self.command(opcode::BEGIN_PROGRAM)?;
        self.delay.delay_us(timing::WORD_PROGRAM_US);
        Ok(())
    }

    pub fn increment_address(&mut self) -> Result<(), Error> {
        self.command(opcode::INCREMENT_ADDRESS)
    }

    // ----- Composite operations -----

    /// Program one 64-word flash row with a single begin-program pulse.
    ///
    /// The target buffers the row internally, so all words are latched first (auto-incrementing
    /// for all but the last) and committed together.
    pub fn program_flash_row(
        &mut self,
        addr: u32,
        words: &[u16; FLASH_ROW_WORDS],
        erase_first: bool,
    ) -> Result<(), Error> {
        debug!("program row {:#08x}", addr);
        self.load_address(addr)?;
        if erase_first {
            self.erase_page()?;
        }

        let (head, last) = words.split_at(FLASH_ROW_WORDS - 1);
        for &word in head {
            self.command_with(opcode::LOAD_DATA_INC, u32::from(word))?;
        }
        self.command_with(opcode::LOAD_DATA, u32::from(last[0]))?;
        self.command(opcode::BEGIN_PROGRAM)?;
        self.delay.delay_ms(timing::ROW_PROGRAM_MS);
        Ok(())
    }

    /// Program bytes one at a time from `addr` (EEPROM). Each byte is its own program cycle.
    pub fn program_bytes_sequential(
        &mut self,
        addr: u32,
        bytes: &[u8],
        erase_first: bool,
    ) -> Result<(), Error> {
        debug!("program {} bytes at {:#08x}", bytes.len(), addr);
        self.load_address(addr)?;
        if erase_first {
            self.erase_page()?;
        }

        for &b in bytes {
            self.write_word(u16::from(b), true)?;
            self.delay.delay_ms(timing::EEPROM_BYTE_MS);
        }
        Ok(())
    }

    /// Program configuration words from little-endian byte pairs.
    ///
    /// Every word is written, including all-ones values: some protection bits do not erase to 1.
    /// An odd trailing byte is written with its high byte set to 0xFF.
    pub fn program_config_words(&mut self, addr: u32, bytes: &[u8]) -> Result<(), Error> {
        debug!("program {} config bytes at {:#08x}", bytes.len(), addr);
        for (i, pair) in bytes.chunks(2).enumerate() {
            let lo = pair[0];
            let hi = pair.get(1).copied().unwrap_or(0xFF);
            let word = u16::from_le_bytes([lo, hi]);

            self.load_address(addr.wrapping_add(2 * i as u32))?;
            self.write_word(word, false)?;
            self.delay.delay_ms(timing::CONFIG_WORD_MS);
        }
        Ok(())
    }

    /// Fill `out` from `addr` onwards.
    ///
    /// Word regions unpack each word little-endian, keeping only the low byte of the final word
    /// when `out` has odd length. EEPROM keeps the low byte of every word.
    pub fn read_sequential(
        &mut self,
        addr: u32,
        out: &mut [u8],
        region: Region,
    ) -> Result<(), Error> {
        trace!("read {} bytes at {:#08x} ({:?})", out.len(), addr, region);
        self.load_address(addr)?;

        match region.unit() {
            Unit::ByteInWord => {
                for b in out.iter_mut() {
                    *b = self.read_word(true)?.to_le_bytes()[0];
                }
            }
            Unit::Word => {
                for chunk in out.chunks_mut(2) {
                    let [lo, hi] = self.read_word(true)?.to_le_bytes();
                    chunk[0] = lo;
                    if let Some(b) = chunk.get_mut(1) {
                        *b = hi;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn read_device_id(&mut self) -> Result<u16, Error> {
        self.read_id_word(DEVICE_ID_ADDR)
    }

    pub fn read_revision_id(&mut self) -> Result<u16, Error> {
        self.read_id_word(REVISION_ID_ADDR)
    }

    /// Release the owned peripherals.
    pub fn free(self) -> (SPI, DAT, MCLR, D) {
        (self.spi, self.dat, self.mclr, self.delay)
    }

    // ----- Bus helpers -----

    fn read_id_word(&mut self, addr: u32) -> Result<u16, Error> {
        self.load_address(addr)?;
        self.delay.delay_us(timing::ID_SETTLE_US);
        self.read_word(false)
    }

    #[inline]
    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::SessionInactive)
        }
    }

    /// Opcode with no payload.
    fn command(&mut self, op: u8) -> Result<(), Error> {
        self.ensure_active()?;
        self.transmit(&[op])
    }

    /// Opcode followed by the packed 3-byte field.
    fn command_with(&mut self, op: u8, value: u32) -> Result<(), Error> {
        self.ensure_active()?;
        let [a, b, c] = pack_field(value);
        self.transmit(&[op, a, b, c])
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.spi
            .write(bytes)
            .and_then(|_| self.spi.flush())
            .map_err(|e| Error::Bus(e.kind()))
    }
}
