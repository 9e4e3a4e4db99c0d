// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command and status tables for the host link, plus the decoded request and outgoing response.

use core::fmt;

use heapless::Vec;

/// Largest payload either direction may carry.
pub const MAX_PAYLOAD: usize = 256;

/// Command/status byte plus the 2-byte little-endian length.
pub const HEADER_LEN: usize = 3;

/// Header, largest payload and CRC trailer.
pub const MAX_FRAME: usize = HEADER_LEN + MAX_PAYLOAD + 1;

// Command IDs
pub const CMD_DIAG: u8 = 0x01;
pub const CMD_ERASE: u8 = 0x02;
pub const CMD_WRITE_PAGE: u8 = 0x03;
pub const CMD_WRITE_CONFIG: u8 = 0x04;
pub const CMD_WRITE_EEPROM: u8 = 0x05;
pub const CMD_READ: u8 = 0x06;
pub const CMD_RESET_TARGET: u8 = 0x07;
pub const CMD_TEST_EEPROM: u8 = 0x08;
pub const CMD_VERSION: u8 = 0x09;

/// Fixed-capacity payload buffer. Its length is the frame's length field.
pub type Payload = Vec<u8, MAX_PAYLOAD>;

/// Host commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Diag,
    Erase,
    WritePage,
    WriteConfig,
    WriteEeprom,
    Read,
    ResetTarget,
    TestEeprom,
    Version,
}

impl Command {
    /// Map a wire command id to a command, `None` for ids this firmware does not know.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            CMD_DIAG => Some(Command::Diag),
            CMD_ERASE => Some(Command::Erase),
            CMD_WRITE_PAGE => Some(Command::WritePage),
            CMD_WRITE_CONFIG => Some(Command::WriteConfig),
            CMD_WRITE_EEPROM => Some(Command::WriteEeprom),
            CMD_READ => Some(Command::Read),
            CMD_RESET_TARGET => Some(Command::ResetTarget),
            CMD_TEST_EEPROM => Some(Command::TestEeprom),
            CMD_VERSION => Some(Command::Version),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Command::Diag => CMD_DIAG,
            Command::Erase => CMD_ERASE,
            Command::WritePage => CMD_WRITE_PAGE,
            Command::WriteConfig => CMD_WRITE_CONFIG,
            Command::WriteEeprom => CMD_WRITE_EEPROM,
            Command::Read => CMD_READ,
            Command::ResetTarget => CMD_RESET_TARGET,
            Command::TestEeprom => CMD_TEST_EEPROM,
            Command::Version => CMD_VERSION,
        }
    }
}

/// Response status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    /// Unrecognized command id.
    InvalidCommand = 0x01,
    CrcMismatch = 0x02,
    /// No target answered the device-id probe.
    TargetAbsent = 0x03,
    /// Reserved for read-back verification.
    VerifyFailed = 0x04,
    /// Malformed or undersized payload.
    BadPayload = 0x05,
}

impl Status {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::InvalidCommand => "invalid command",
            Status::CrcMismatch => "CRC mismatch",
            Status::TargetAbsent => "no target detected",
            Status::VerifyFailed => "verification failed",
            Status::BadPayload => "invalid payload",
        };
        f.write_str(name)
    }
}

/// One decoded host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub cmd: u8,
    pub payload: Payload,
}

impl Request {
    /// Build a request from raw parts, `None` if `payload` exceeds [`MAX_PAYLOAD`].
    pub fn new(cmd: u8, payload: &[u8]) -> Option<Self> {
        Some(Self {
            cmd,
            payload: Payload::from_slice(payload).ok()?,
        })
    }

    #[inline]
    pub fn command(&self) -> Option<Command> {
        Command::from_id(self.cmd)
    }
}

/// One outgoing reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub payload: Payload,
}

impl Response {
    /// `OK` with no payload.
    pub fn ok() -> Self {
        Self::error(Status::Ok)
    }

    /// A bare status with no payload.
    pub fn error(status: Status) -> Self {
        Self {
            status,
            payload: Payload::new(),
        }
    }

    /// `OK` carrying `data`, truncated to [`MAX_PAYLOAD`].
    pub fn with_data(data: &[u8]) -> Self {
        let n = data.len().min(MAX_PAYLOAD);
        Self {
            status: Status::Ok,
            payload: Payload::from_slice(&data[..n]).unwrap_or_default(),
        }
    }
}
