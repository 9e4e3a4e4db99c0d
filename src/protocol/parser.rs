// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time frame parser for the host link.
//!
//! Frames have no delimiters, so the parser tracks its position inside the current frame and
//! accumulates the CRC as bytes arrive. A length field above [`MAX_PAYLOAD`] is treated as a
//! desync: the claimed payload and trailer (`len + 1` bytes) are swallowed so the next byte lands
//! on a frame boundary again.

use crate::protocol::crc::{Crc8Digest, CRC8};
use crate::protocol::messages::{Payload, Request, MAX_PAYLOAD};

enum State {
    WaitCommand,
    WaitLenLo { cmd: u8 },
    WaitLenHi { cmd: u8, lo: u8 },
    Payload { cmd: u8, len: usize },
    WaitCrc { cmd: u8 },
    Drain { remaining: u32 },
}

/// Outcome of a completed frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// Frame with a valid trailer.
    Request(Request),
    /// Trailer did not match the header and payload.
    CrcMismatch { cmd: u8 },
    /// Length field exceeded [`MAX_PAYLOAD`]; the claimed bytes have been drained.
    Oversize { len: u16 },
}

pub struct Parser {
    state: State,
    crc: Crc8Digest,
    payload: Payload,
    oversize_len: u16,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::WaitCommand,
            crc: CRC8.digest(),
            payload: Payload::new(),
            oversize_len: 0,
        }
    }

    /// Drop any partial frame and wait for a command byte.
    pub fn reset(&mut self) {
        self.state = State::WaitCommand;
        self.crc = CRC8.digest();
        self.payload.clear();
    }

    /// True when no frame is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::WaitCommand)
    }

    /// Process a single incoming byte. Returns `Some(Event)` when a frame is complete.
    pub fn push(&mut self, byte: u8) -> Option<Event> {
        match self.state {
            State::WaitCommand => {
                self.reset();
                self.crc.update(&[byte]);
                self.state = State::WaitLenLo { cmd: byte };
            }
            State::WaitLenLo { cmd } => {
                self.crc.update(&[byte]);
                self.state = State::WaitLenHi { cmd, lo: byte };
            }
            State::WaitLenHi { cmd, lo } => {
                self.crc.update(&[byte]);
                let len = u16::from_le_bytes([lo, byte]);

                self.state = if usize::from(len) > MAX_PAYLOAD {
                    self.oversize_len = len;
                    State::Drain {
                        remaining: u32::from(len) + 1,
                    }
                } else if len == 0 {
                    State::WaitCrc { cmd }
                } else {
                    State::Payload {
                        cmd,
                        len: usize::from(len),
                    }
                };
            }
            State::Payload { cmd, len } => {
                self.crc.update(&[byte]);
                // Capacity is guaranteed by the length check above.
                let _ = self.payload.push(byte);
                if self.payload.len() == len {
                    self.state = State::WaitCrc { cmd };
                }
            }
            State::WaitCrc { cmd } => {
                let expected = core::mem::replace(&mut self.crc, CRC8.digest()).finalize();
                let valid = byte == expected;
                self.state = State::WaitCommand;

                if !valid {
                    self.payload.clear();
                    return Some(Event::CrcMismatch { cmd });
                }
                return Some(Event::Request(Request {
                    cmd,
                    payload: core::mem::take(&mut self.payload),
                }));
            }
            State::Drain { remaining } => {
                if remaining > 1 {
                    self.state = State::Drain {
                        remaining: remaining - 1,
                    };
                } else {
                    self.state = State::WaitCommand;
                    return Some(Event::Oversize {
                        len: self.oversize_len,
                    });
                }
            }
        }
        None
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
