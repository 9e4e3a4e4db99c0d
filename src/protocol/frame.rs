// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Frame codec over a blocking byte stream.
//!
//! ```text
//! Request:  [CMD:1]    [LEN:2 LE] [PAYLOAD:LEN] [CRC8:1]
//! Response: [STATUS:1] [LEN:2 LE] [PAYLOAD:LEN] [CRC8:1]
//! ```
//!
//! The CRC covers the header and payload. A frame that fails its CRC is answered here with a bare
//! `CrcMismatch` status; every other reply is produced by the dispatcher and sent through
//! [`FrameCodec::send`].

use core::fmt;

use embedded_io::{Read, Write};
use log::{trace, warn};

use crate::protocol::crc::crc8;
use crate::protocol::messages::{Request, Response, Status, HEADER_LEN, MAX_FRAME, MAX_PAYLOAD};
use crate::protocol::parser::{Event, Parser};

/// Codec-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Trailer mismatch. A `CrcMismatch` response has already been sent.
    Crc,
    /// Length field above [`MAX_PAYLOAD`]. The claimed bytes were drained and nothing was sent.
    OversizePayload,
    /// The stream delivered fewer bytes than the frame needs, or refused a write.
    StreamEnded,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Crc => f.write_str("frame CRC mismatch"),
            FrameError::OversizePayload => f.write_str("frame length exceeds maximum payload"),
            FrameError::StreamEnded => f.write_str("byte stream ended mid-frame"),
        }
    }
}

/// Assemble a complete frame into `out` and return its length.
///
/// The first byte is the command id for requests and the status for responses.
pub fn encode(first: u8, payload: &[u8], out: &mut [u8; MAX_FRAME]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::OversizePayload);
    }
    let len = payload.len() as u16;
    let end = HEADER_LEN + payload.len();

    out[0] = first;
    out[1..HEADER_LEN].copy_from_slice(&len.to_le_bytes());
    out[HEADER_LEN..end].copy_from_slice(payload);
    out[end] = crc8(&out[..end]);

    Ok(end + 1)
}

/// Owns the host byte stream and moves frames across it.
pub struct FrameCodec<S> {
    stream: S,
    parser: Parser,
}

impl<S> FrameCodec<S>
where
    S: Read + Write,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            parser: Parser::new(),
        }
    }

    /// Block until one frame has been read.
    pub fn decode(&mut self) -> Result<Request, FrameError> {
        let mut byte = [0u8; 1];
        loop {
            match self.stream.read(&mut byte) {
                Ok(1) => {}
                Ok(_) | Err(_) => {
                    if !self.parser.is_idle() {
                        trace!("stream ended inside a frame");
                    }
                    self.parser.reset();
                    return Err(FrameError::StreamEnded);
                }
            }

            match self.parser.push(byte[0]) {
                None => continue,
                Some(Event::Request(req)) => {
                    trace!("frame cmd={:#04x} len={}", req.cmd, req.payload.len());
                    return Ok(req);
                }
                Some(Event::CrcMismatch { cmd }) => {
                    warn!("CRC mismatch on frame cmd={:#04x}", cmd);
                    self.send_status(Status::CrcMismatch)?;
                    return Err(FrameError::Crc);
                }
                Some(Event::Oversize { len }) => {
                    warn!("dropped frame with oversize length {}", len);
                    return Err(FrameError::OversizePayload);
                }
            }
        }
    }

    /// Encode and transmit a response as a single write.
    pub fn send(&mut self, response: &Response) -> Result<(), FrameError> {
        self.send_raw(response.status.code(), &response.payload)
    }

    fn send_status(&mut self, status: Status) -> Result<(), FrameError> {
        self.send_raw(status.code(), &[])
    }

    fn send_raw(&mut self, first: u8, payload: &[u8]) -> Result<(), FrameError> {
        let mut frame = [0u8; MAX_FRAME];
        let n = encode(first, payload, &mut frame)?;

        self.stream
            .write_all(&frame[..n])
            .map_err(|_| FrameError::StreamEnded)?;
        self.stream.flush().map_err(|_| FrameError::StreamEnded)
    }

    pub fn stream(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn free(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::{CMD_VERSION, CMD_WRITE_PAGE};
    use crate::testing::Pipe;

    fn frame(first: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = [0u8; MAX_FRAME];
        let n = encode(first, payload, &mut out).unwrap();
        out[..n].to_vec()
    }

    #[test]
    fn encode_layout() {
        let bytes = frame(0x00, b"ok");
        assert_eq!(&bytes[..5], &[0x00, 0x02, 0x00, b'o', b'k']);
        assert_eq!(bytes[5], crc8(&[0x00, 0x02, 0x00, b'o', b'k']));
    }

    #[test]
    fn encode_rejects_oversize_payload() {
        let mut out = [0u8; MAX_FRAME];
        assert_eq!(
            encode(0x00, &[0u8; MAX_PAYLOAD + 1], &mut out),
            Err(FrameError::OversizePayload)
        );
    }

    #[test]
    fn decode_encoded_requests() {
        for len in [0usize, 1, 2, 131, 132, 255, 256] {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let mut codec = FrameCodec::new(Pipe::with_input(&frame(CMD_WRITE_PAGE, &payload)));
            let req = codec.decode().unwrap();
            assert_eq!(req.cmd, CMD_WRITE_PAGE);
            assert_eq!(&req.payload[..], &payload[..]);
        }
    }

    #[test]
    fn send_matches_independent_encoding() {
        let payload = [0x4C, 0x6C, 0x00, 0x10];
        let mut codec = FrameCodec::new(Pipe::default());
        codec.send(&Response::with_data(&payload)).unwrap();

        let mut expected = vec![0x00, 0x04, 0x00];
        expected.extend_from_slice(&payload);
        expected.push(crc8(&expected));
        assert_eq!(codec.free().output, expected);
    }

    #[test]
    fn single_bit_corruption_is_caught() {
        let good = frame(CMD_WRITE_PAGE, &[0x00, 0x10, 0x00, 0x00, 0xA5, 0x5A, 0xFF]);
        // Command byte, payload and trailer. The length bytes are left intact so the frame keeps
        // its shape.
        let positions = core::iter::once(0).chain(HEADER_LEN..good.len());
        for pos in positions {
            for bit in 0..8 {
                let mut corrupted = good.clone();
                corrupted[pos] ^= 1 << bit;

                let mut codec = FrameCodec::new(Pipe::with_input(&corrupted));
                assert_eq!(codec.decode(), Err(FrameError::Crc), "byte {pos} bit {bit}");
                let out = codec.free().output;
                assert_eq!(out[0], Status::CrcMismatch.code());
                assert_eq!(&out[1..3], &[0x00, 0x00]);
            }
        }
    }

    #[test]
    fn crc_error_frame_is_well_formed() {
        let mut bad = frame(CMD_VERSION, &[]);
        bad[3] ^= 0xFF;
        let mut codec = FrameCodec::new(Pipe::with_input(&bad));
        assert_eq!(codec.decode(), Err(FrameError::Crc));
        assert_eq!(codec.free().output, frame(0x02, &[]));
    }

    #[test]
    fn oversize_is_drained_silently() {
        let mut input = vec![CMD_WRITE_PAGE, 0x2C, 0x01]; // len = 300
        input.extend(core::iter::repeat(0x55).take(301));
        let next = frame(CMD_VERSION, &[]);
        input.extend_from_slice(&next);

        let mut codec = FrameCodec::new(Pipe::with_input(&input));
        assert_eq!(codec.decode(), Err(FrameError::OversizePayload));
        assert_eq!(codec.stream().input.len(), next.len());
        assert!(codec.stream().output.is_empty());

        let req = codec.decode().unwrap();
        assert_eq!(req.cmd, CMD_VERSION);
    }

    #[test]
    fn short_read_emits_nothing() {
        let whole = frame(CMD_WRITE_PAGE, &[1, 2, 3, 4]);
        for cut in 0..whole.len() {
            let mut codec = FrameCodec::new(Pipe::with_input(&whole[..cut]));
            assert_eq!(codec.decode(), Err(FrameError::StreamEnded));
            assert!(codec.free().output.is_empty());
        }
    }

    #[test]
    fn decode_resumes_after_stream_end() {
        let whole = frame(CMD_VERSION, &[]);
        let mut codec = FrameCodec::new(Pipe::with_input(&whole[..2]));
        assert_eq!(codec.decode(), Err(FrameError::StreamEnded));

        codec.stream().push_input(&whole);
        assert_eq!(codec.decode().unwrap().cmd, CMD_VERSION);
    }
}
