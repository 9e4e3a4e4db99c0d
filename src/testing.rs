// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side fakes: a simulated ICSP target and an in-memory byte stream.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::drivers::icsp::region::{
    Region, DEVICE_ID_ADDR, EEPROM_END, EEPROM_START, FLASH_ROW_BYTES, REVISION_ID_ADDR,
};
use crate::drivers::icsp::{opcode, pack_field, DataLine, IcspEngine, LVP_KEY};

/// One observable bus, pin or delay event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Mclr(bool),
    Key,
    LoadPc(u32),
    Data { increment: bool, value: u16 },
    BulkErase(u32),
    PageErase(u32),
    Read { increment: bool, value: u16 },
    Increment,
    BeginProgram,
    Release,
    Drive,
    DelayNs(u32),
    DelayUs(u32),
    DelayMs(u32),
    Unknown(u8),
}

/// Simulated PIC18 target on the other end of the ICSP lines.
pub struct SimTarget {
    pub log: Vec<Op>,
    /// Every byte clocked out by the host.
    pub mosi: Vec<u8>,
    pub pc: u32,
    /// Flash, user id and config words.
    pub words: BTreeMap<u32, u16>,
    pub eeprom: BTreeMap<u32, u8>,
    pub device_id: u16,
    pub revision_id: u16,
    /// Drop EEPROM commits, so self-test read-back fails.
    pub eeprom_write_protect: bool,
    /// Reads clocked in while the host still drove PGD.
    pub contention: usize,
    /// Fail every SPI read.
    pub read_fault: bool,
    /// Fail every attempt to take PGD back.
    pub drive_fault: bool,

    latch: Vec<(u32, u16)>,
    field: Option<(u8, Vec<u8>)>,
    pending_read: Option<u16>,
    released: bool,
    mclr_low: bool,
    keyed: bool,
    key_buf: Vec<u8>,
}

impl Default for SimTarget {
    fn default() -> Self {
        Self {
            log: Vec::new(),
            mosi: Vec::new(),
            pc: 0,
            words: BTreeMap::new(),
            eeprom: BTreeMap::new(),
            device_id: 0x6C40,
            revision_id: 0xA042,
            eeprom_write_protect: false,
            contention: 0,
            read_fault: false,
            drive_fault: false,
            latch: Vec::new(),
            field: None,
            pending_read: None,
            released: false,
            mclr_low: false,
            keyed: false,
            key_buf: Vec::new(),
        }
    }
}

impl SimTarget {
    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.log.iter().filter(|op| pred(op)).count()
    }

    pub fn clear_trace(&mut self) {
        self.log.clear();
        self.mosi.clear();
    }

    /// Word at `addr`, erased value if never written.
    pub fn word(&self, addr: u32) -> u16 {
        self.words.get(&addr).copied().unwrap_or(0xFFFF)
    }

    pub fn eeprom_byte(&self, addr: u32) -> u8 {
        self.eeprom.get(&addr).copied().unwrap_or(0xFF)
    }

    /// `(increment, value)` of every load-data command, in order.
    pub fn data_values(&self) -> Vec<(bool, u16)> {
        self.log
            .iter()
            .filter_map(|op| match *op {
                Op::Data { increment, value } => Some((increment, value)),
                _ => None,
            })
            .collect()
    }

    pub fn loaded_addresses(&self) -> Vec<u32> {
        self.log
            .iter()
            .filter_map(|op| match *op {
                Op::LoadPc(addr) => Some(addr),
                _ => None,
            })
            .collect()
    }

    fn set_mclr(&mut self, high: bool) {
        self.log.push(Op::Mclr(high));
        self.mclr_low = !high;
        self.keyed = false;
        self.key_buf.clear();
        self.field = None;
        self.latch.clear();
    }

    fn is_eeprom(addr: u32) -> bool {
        (EEPROM_START..=EEPROM_END).contains(&addr)
    }

    fn advance(&mut self) {
        self.pc += if Self::is_eeprom(self.pc) { 1 } else { 2 };
    }

    fn read_at(&self, addr: u32) -> u16 {
        match addr {
            DEVICE_ID_ADDR => self.device_id,
            REVISION_ID_ADDR => self.revision_id,
            a if Self::is_eeprom(a) => u16::from(self.eeprom_byte(a)),
            a => self.word(a),
        }
    }

    fn clock_out(&mut self, byte: u8) {
        self.mosi.push(byte);

        if self.mclr_low && !self.keyed {
            self.key_buf.push(byte);
            if self.key_buf.len() == LVP_KEY.len() {
                if self.key_buf[..] == LVP_KEY[..] {
                    self.keyed = true;
                    self.log.push(Op::Key);
                } else {
                    self.log.push(Op::Unknown(byte));
                }
                self.key_buf.clear();
            }
            return;
        }
        if !self.keyed {
            self.log.push(Op::Unknown(byte));
            return;
        }

        if let Some((op, mut bytes)) = self.field.take() {
            bytes.push(byte);
            if bytes.len() == 3 {
                let raw = (u32::from(bytes[0]) << 16)
                    | (u32::from(bytes[1]) << 8)
                    | u32::from(bytes[2]);
                self.execute_with(op, raw >> 1);
            } else {
                self.field = Some((op, bytes));
            }
            return;
        }

        match byte {
            opcode::LOAD_PC | opcode::LOAD_DATA | opcode::LOAD_DATA_INC => {
                self.field = Some((byte, Vec::new()));
            }
            opcode::BULK_ERASE => {
                self.log.push(Op::BulkErase(self.pc));
                match Region::containing(self.pc) {
                    Region::Eeprom => self.eeprom.clear(),
                    region => self.words.retain(|a, _| Region::containing(*a) != region),
                }
            }
            opcode::PAGE_ERASE => {
                self.log.push(Op::PageErase(self.pc));
                let row = self.pc & !(FLASH_ROW_BYTES as u32 - 1);
                self.words
                    .retain(|a, _| !(row..row + FLASH_ROW_BYTES as u32).contains(a));
            }
            opcode::READ_DATA | opcode::READ_DATA_INC => {
                let increment = byte == opcode::READ_DATA_INC;
                let value = self.read_at(self.pc);
                self.log.push(Op::Read { increment, value });
                self.pending_read = Some(value);
                if increment {
                    self.advance();
                }
            }
            opcode::INCREMENT_ADDRESS => {
                self.log.push(Op::Increment);
                self.advance();
            }
            opcode::BEGIN_PROGRAM => {
                self.log.push(Op::BeginProgram);
                for (addr, value) in std::mem::take(&mut self.latch) {
                    if Self::is_eeprom(addr) {
                        if !self.eeprom_write_protect {
                            self.eeprom.insert(addr, value as u8);
                        }
                    } else {
                        self.words.insert(addr, value);
                    }
                }
            }
            other => self.log.push(Op::Unknown(other)),
        }
    }

    fn execute_with(&mut self, op: u8, value: u32) {
        match op {
            opcode::LOAD_PC => {
                self.pc = value & 0x3F_FFFF;
                self.log.push(Op::LoadPc(self.pc));
            }
            _ => {
                let increment = op == opcode::LOAD_DATA_INC;
                let value = value as u16;
                self.log.push(Op::Data { increment, value });
                self.latch.push((self.pc, value));
                if increment {
                    self.advance();
                }
            }
        }
    }

    fn clock_in(&mut self, words: &mut [u8]) {
        if !self.released {
            self.contention += 1;
        }
        let raw = self
            .pending_read
            .take()
            .map(|v| pack_field(u32::from(v)))
            .unwrap_or([0xFF; 3]);
        for (i, w) in words.iter_mut().enumerate() {
            *w = raw.get(i).copied().unwrap_or(0xFF);
        }
    }
}

pub type Shared = Rc<RefCell<SimTarget>>;

pub struct SimSpi(Shared);
pub struct SimData(Shared);
pub struct SimMclr(Shared);
pub struct SimDelay(Shared);

impl spi::ErrorType for SimSpi {
    type Error = spi::ErrorKind;
}

impl SpiBus for SimSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut sim = self.0.borrow_mut();
        if sim.read_fault {
            return Err(spi::ErrorKind::Overrun);
        }
        sim.clock_in(words);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut sim = self.0.borrow_mut();
        for &b in words {
            sim.clock_out(b);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let out = words.to_vec();
        self.write(&out)?;
        self.read(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl DataLine for SimData {
    type Error = ();

    fn release(&mut self) -> Result<(), Self::Error> {
        let mut sim = self.0.borrow_mut();
        sim.released = true;
        sim.log.push(Op::Release);
        Ok(())
    }

    fn drive(&mut self) -> Result<(), Self::Error> {
        let mut sim = self.0.borrow_mut();
        if sim.drive_fault {
            return Err(());
        }
        sim.released = false;
        sim.log.push(Op::Drive);
        Ok(())
    }
}

impl digital::ErrorType for SimMclr {
    type Error = Infallible;
}

impl OutputPin for SimMclr {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_mclr(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_mclr(true);
        Ok(())
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().log.push(Op::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().log.push(Op::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().log.push(Op::DelayMs(ms));
    }
}

pub type SimEngine = IcspEngine<SimSpi, SimData, SimMclr, SimDelay>;

/// Engine wired to a fresh simulated target, with construction events cleared.
pub fn sim_engine() -> (Shared, SimEngine) {
    let sim: Shared = Rc::new(RefCell::new(SimTarget::default()));
    let icsp = IcspEngine::new(
        SimSpi(sim.clone()),
        SimData(sim.clone()),
        SimMclr(sim.clone()),
        SimDelay(sim.clone()),
    );
    sim.borrow_mut().clear_trace();
    (sim, icsp)
}

/// Output pin that records every level it is driven to.
#[derive(Default)]
pub struct FakePin {
    pub levels: Vec<bool>,
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.push(true);
        Ok(())
    }
}

/// In-memory byte stream: queued input, captured output.
#[derive(Default)]
pub struct Pipe {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl Pipe {
    pub fn with_input(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }
}

impl embedded_io::ErrorType for Pipe {
    type Error = Infallible;
}

impl embedded_io::Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.input.pop_front() {
                Some(b) => {
                    *slot = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl embedded_io::Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
