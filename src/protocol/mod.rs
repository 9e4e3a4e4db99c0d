// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod crc;
pub mod frame;
pub mod messages;
pub mod parser;

pub use frame::{FrameCodec, FrameError};
pub use messages::{Command, Payload, Request, Response, Status, MAX_PAYLOAD};
pub use parser::Parser;
