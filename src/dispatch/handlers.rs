// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! One handler per host command.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, info};

use crate::config;
use crate::devices;
use crate::dispatch::payload::{parse_block, parse_page, parse_read};
use crate::dispatch::{CommandError, Dispatcher};
use crate::drivers::icsp::region::{Region, Regions, EEPROM_START};
use crate::drivers::icsp::{timing, DataLine};
use crate::protocol::{Response, MAX_PAYLOAD};

/// Wait after leaving the session before anything else touches the target.
const RESET_SETTLE_MS: u32 = 10;

/// EEPROM self-test pattern, written from the start of EEPROM.
const TEST_PATTERN: [u8; 4] = [0xBB, 0xCC, 0xDD, 0xEE];

/// Device ids a floating or shorted PGD line reads back as.
#[inline]
fn id_is_absent(id: u16) -> bool {
    id == 0x0000 || id == 0xFFFF
}

impl<SPI, DAT, MCLR, D> Dispatcher<SPI, DAT, MCLR, D>
where
    SPI: SpiBus,
    DAT: DataLine,
    MCLR: OutputPin,
    D: DelayNs,
{
    /// Enter a session and check that something answers the device-id read.
    ///
    /// Leaves the session again when nothing does.
    fn probe_target(&mut self) -> Result<u16, CommandError> {
        self.icsp.enter()?;
        let id = self.icsp.read_device_id()?;
        if id_is_absent(id) {
            self.icsp.exit()?;
            return Err(CommandError::TargetAbsent);
        }
        Ok(id)
    }

    /// Leave the session, then give the target time to settle before re-entering.
    fn cycle_session(&mut self) -> Result<(), CommandError> {
        self.icsp.exit()?;
        self.icsp.wait_ms(RESET_SETTLE_MS);
        self.icsp.enter()?;
        Ok(())
    }

    /// Response: `[DEVICE_ID:2 LE] [REVISION_ID:2 LE] [NAME]`. Always releases the target.
    pub(super) fn diag(&mut self) -> Result<Response, CommandError> {
        self.icsp.enter()?;
        let id = self.icsp.read_device_id()?;
        let rev = self.icsp.read_revision_id()?;
        self.icsp.exit()?;
        if id_is_absent(id) {
            return Err(CommandError::TargetAbsent);
        }

        let device = devices::identify(id);
        info!("target {} id={:#06x} rev={:#06x}", device.name, id, rev);

        let mut data = [0u8; 4 + 32];
        data[..2].copy_from_slice(&id.to_le_bytes());
        data[2..4].copy_from_slice(&rev.to_le_bytes());
        let name = device.name.as_bytes();
        let n = name.len().min(data.len() - 4);
        data[4..4 + n].copy_from_slice(&name[..n]);

        Ok(Response::with_data(&data[..4 + n]))
    }

    pub(super) fn erase(&mut self) -> Result<Response, CommandError> {
        self.probe_target()?;
        self.icsp.bulk_erase(Regions::all())?;
        self.icsp.exit()?;
        Ok(Response::ok())
    }

    /// Leaves the session open so consecutive pages skip the enter sequence.
    pub(super) fn write_page(&mut self, payload: &[u8]) -> Result<Response, CommandError> {
        let page = parse_page(payload)?;
        self.icsp.enter()?;
        self.icsp.program_flash_row(page.addr, &page.words, true)?;
        Ok(Response::ok())
    }

    pub(super) fn write_config(&mut self, payload: &[u8]) -> Result<Response, CommandError> {
        let block = parse_block(payload)?;
        self.icsp.enter()?;
        self.icsp.program_config_words(block.addr, block.data)?;
        Ok(Response::ok())
    }

    pub(super) fn write_eeprom(&mut self, payload: &[u8]) -> Result<Response, CommandError> {
        let block = parse_block(payload)?;
        self.icsp.enter()?;
        self.icsp
            .program_bytes_sequential(block.addr, block.data, false)?;
        Ok(Response::ok())
    }

    pub(super) fn read(&mut self, payload: &[u8]) -> Result<Response, CommandError> {
        let range = parse_read(payload)?;
        let region = Region::containing(range.addr);

        self.icsp.enter()?;
        let mut buf = [0u8; MAX_PAYLOAD];
        let out = &mut buf[..range.len];
        self.icsp.read_sequential(range.addr, out, region)?;
        Ok(Response::with_data(out))
    }

    pub(super) fn reset_target(&mut self) -> Result<Response, CommandError> {
        self.icsp.exit()?;
        self.icsp.wait_ms(RESET_SETTLE_MS);
        Ok(Response::ok())
    }

    /// Erase EEPROM, write a fixed pattern, read it back.
    ///
    /// The verdict travels as a single data byte (1 pass, 0 fail) under an `OK` status.
    pub(super) fn test_eeprom(&mut self) -> Result<Response, CommandError> {
        self.probe_target()?;

        self.icsp.bulk_erase(Regions::EEPROM)?;
        self.cycle_session()?;

        self.icsp.load_address(EEPROM_START)?;
        for &b in &TEST_PATTERN {
            self.icsp.write_word(u16::from(b), false)?;
            self.icsp.wait_ms(timing::EEPROM_BYTE_MS);
            self.icsp.increment_address()?;
        }
        self.cycle_session()?;

        let mut readback = [0u8; TEST_PATTERN.len()];
        self.icsp
            .read_sequential(EEPROM_START, &mut readback, Region::Eeprom)?;
        self.icsp.exit()?;

        let passed = readback == TEST_PATTERN;
        debug!("EEPROM self-test read {:02x?}, pass={}", readback, passed);
        Ok(Response::with_data(&[u8::from(passed)]))
    }

    pub(super) fn version(&self) -> Response {
        Response::with_data(config::VERSION.as_bytes())
    }
}
