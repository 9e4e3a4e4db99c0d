// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Command Dispatcher
//!
//! Turns one decoded [`Request`] into one [`Response`]. Each [`Command`] variant has exactly one
//! handler in [`handlers`]; payloads are checked against their contract in [`payload`] before the
//! target is touched, so a malformed request never changes the session state.
//!
//! Handlers fail with a [`CommandError`], which selects the response status.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use log::{debug, error, warn};

use crate::drivers::icsp::{self, DataLine, IcspEngine};
use crate::protocol::{Command, Request, Response, Status};

pub mod handlers;
pub mod payload;

pub use payload::PayloadError;

/// Why a command produced an error status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    UnknownCommand(u8),
    Payload(PayloadError),
    /// Device id read back as 0x0000 or 0xFFFF.
    TargetAbsent,
    Icsp(icsp::Error),
}

impl CommandError {
    pub fn status(&self) -> Status {
        match self {
            CommandError::UnknownCommand(_) => Status::InvalidCommand,
            CommandError::Payload(_) => Status::BadPayload,
            CommandError::TargetAbsent | CommandError::Icsp(_) => Status::TargetAbsent,
        }
    }
}

impl From<PayloadError> for CommandError {
    fn from(e: PayloadError) -> Self {
        CommandError::Payload(e)
    }
}

impl From<icsp::Error> for CommandError {
    fn from(e: icsp::Error) -> Self {
        CommandError::Icsp(e)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(id) => write!(f, "unknown command {id:#04x}"),
            CommandError::Payload(e) => write!(f, "bad payload: {e}"),
            CommandError::TargetAbsent => f.write_str("no target on the ICSP lines"),
            CommandError::Icsp(e) => write!(f, "{e}"),
        }
    }
}

/// Sole owner of the ICSP engine.
pub struct Dispatcher<SPI, DAT, MCLR, D> {
    icsp: IcspEngine<SPI, DAT, MCLR, D>,
}

impl<SPI, DAT, MCLR, D> Dispatcher<SPI, DAT, MCLR, D>
where
    SPI: SpiBus,
    DAT: DataLine,
    MCLR: OutputPin,
    D: DelayNs,
{
    pub fn new(icsp: IcspEngine<SPI, DAT, MCLR, D>) -> Self {
        Self { icsp }
    }

    /// Run one request to completion.
    pub fn handle(&mut self, req: &Request) -> Response {
        match self.execute(req) {
            Ok(resp) => resp,
            Err(e) => {
                match e {
                    CommandError::Icsp(_) => error!("cmd {:#04x}: {}", req.cmd, e),
                    _ => warn!("cmd {:#04x}: {}", req.cmd, e),
                }
                Response::error(e.status())
            }
        }
    }

    fn execute(&mut self, req: &Request) -> Result<Response, CommandError> {
        let cmd = req
            .command()
            .ok_or(CommandError::UnknownCommand(req.cmd))?;
        debug!("dispatch {:?} ({} byte payload)", cmd, req.payload.len());

        let payload = &req.payload[..];
        match cmd {
            Command::Diag => self.diag(),
            Command::Erase => self.erase(),
            Command::WritePage => self.write_page(payload),
            Command::WriteConfig => self.write_config(payload),
            Command::WriteEeprom => self.write_eeprom(payload),
            Command::Read => self.read(payload),
            Command::ResetTarget => self.reset_target(),
            Command::TestEeprom => self.test_eeprom(),
            Command::Version => Ok(self.version()),
        }
    }

    #[inline]
    pub fn icsp(&self) -> &IcspEngine<SPI, DAT, MCLR, D> {
        &self.icsp
    }

    pub fn free(self) -> IcspEngine<SPI, DAT, MCLR, D> {
        self.icsp
    }
}
