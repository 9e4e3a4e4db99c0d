// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Main loop: one frame in, one command run to completion, one frame out.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use embedded_io::{Read, Write};
use log::{debug, warn};

use crate::dispatch::Dispatcher;
use crate::drivers::icsp::{DataLine, IcspEngine};
use crate::hw::led::Led;
use crate::protocol::{FrameCodec, FrameError, Status};

pub struct Bridge<S, SPI, DAT, MCLR, D, LED: OutputPin> {
    codec: FrameCodec<S>,
    dispatcher: Dispatcher<SPI, DAT, MCLR, D>,
    activity: Led<LED>,
}

impl<S, SPI, DAT, MCLR, D, LED> Bridge<S, SPI, DAT, MCLR, D, LED>
where
    S: Read + Write,
    SPI: SpiBus,
    DAT: DataLine,
    MCLR: OutputPin,
    D: DelayNs,
    LED: OutputPin,
{
    pub fn new(stream: S, icsp: IcspEngine<SPI, DAT, MCLR, D>, activity: Led<LED>) -> Self {
        Self {
            codec: FrameCodec::new(stream),
            dispatcher: Dispatcher::new(icsp),
            activity,
        }
    }

    /// Read one frame, dispatch it, and send the reply. Returns the status sent.
    ///
    /// The activity LED is lit from a valid frame until its reply is written.
    pub fn poll(&mut self) -> Result<Status, FrameError> {
        let req = self.codec.decode()?;

        self.activity.lit(|| -> Result<Status, FrameError> {
            let resp = self.dispatcher.handle(&req);
            self.codec.send(&resp)?;
            Ok(resp.status)
        })
    }

    /// Serve frames forever. Errors are logged and the loop carries on.
    pub fn run(&mut self) -> ! {
        loop {
            match self.poll() {
                Ok(status) => debug!("replied {}", status),
                // An idle link reads as a short read.
                Err(FrameError::StreamEnded) => {}
                Err(e) => warn!("{}", e),
            }
        }
    }

    pub fn free(self) -> (S, IcspEngine<SPI, DAT, MCLR, D>, Led<LED>) {
        (self.codec.free(), self.dispatcher.free(), self.activity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::drivers::icsp::region::EEPROM_START;
    use crate::protocol::frame::encode;
    use crate::protocol::messages::{CMD_DIAG, CMD_READ, CMD_VERSION, MAX_FRAME};
    use crate::testing::{sim_engine, FakePin, Op, Pipe};

    fn frame(first: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = [0u8; MAX_FRAME];
        let n = encode(first, payload, &mut out).unwrap();
        out[..n].to_vec()
    }

    macro_rules! bridge {
        ($input:expr) => {{
            let (sim, icsp) = sim_engine();
            let bridge = Bridge::new(
                Pipe::with_input($input),
                icsp,
                Led::active_high(FakePin::default()),
            );
            (sim, bridge)
        }};
    }

    #[test]
    fn version_round_trip() {
        let (_sim, mut bridge) = bridge!(&frame(CMD_VERSION, &[]));
        assert_eq!(bridge.poll(), Ok(Status::Ok));

        let (pipe, _, led) = bridge.free();
        assert_eq!(pipe.output, frame(0x00, config::VERSION.as_bytes()));
        assert!(!led.is_on());
        // off at construction, then on and off around the command
        assert_eq!(led.free().levels, vec![false, true, false]);
    }

    #[test]
    fn flipped_crc_never_reaches_dispatch() {
        let mut bad = frame(CMD_DIAG, &[]);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;

        let (sim, mut bridge) = bridge!(&bad);
        assert_eq!(bridge.poll(), Err(FrameError::Crc));
        assert!(sim.borrow().log.is_empty());

        let (pipe, _, led) = bridge.free();
        assert_eq!(pipe.output, frame(0x02, &[]));
        assert_eq!(led.free().levels, vec![false]);
    }

    #[test]
    fn frames_are_served_in_order() {
        let mut input = frame(0x7E, &[]);
        let mut read = EEPROM_START.to_le_bytes().to_vec();
        read.extend_from_slice(&2u16.to_le_bytes());
        input.extend(frame(CMD_READ, &read));

        let (sim, mut bridge) = bridge!(&input);
        sim.borrow_mut().eeprom.insert(EEPROM_START, 0x12);

        assert_eq!(bridge.poll(), Ok(Status::InvalidCommand));
        assert_eq!(bridge.poll(), Ok(Status::Ok));
        assert_eq!(bridge.poll(), Err(FrameError::StreamEnded));

        let mut expected = frame(0x01, &[]);
        expected.extend(frame(0x00, &[0x12, 0xFF]));
        let (pipe, icsp, _) = bridge.free();
        assert_eq!(pipe.output, expected);
        assert!(icsp.is_active());
        assert_eq!(sim.borrow().count(|op| *op == Op::Key), 1);
    }

    #[test]
    fn bad_payload_status_is_framed() {
        let (sim, mut bridge) = bridge!(&frame(CMD_READ, &[0x00, 0x00]));
        assert_eq!(bridge.poll(), Ok(Status::BadPayload));
        assert!(sim.borrow().log.is_empty());
        assert_eq!(bridge.free().0.output, frame(0x05, &[]));
    }
}
