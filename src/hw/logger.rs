// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! `log` backend writing `[LEVEL] message` lines to the debug console.

use core::cell::RefCell;
use core::fmt::Write;

use cortex_m::interrupt::{self, Mutex};
use log::{Log, Metadata, Record, SetLoggerError};
use stm32f7xx_hal::pac::USART2;

use crate::config;
use crate::hw::usart::Usart;

static CONSOLE: Mutex<RefCell<Option<Usart<USART2>>>> = Mutex::new(RefCell::new(None));

static LOGGER: ConsoleLogger = ConsoleLogger;

struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= config::LOG_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        interrupt::free(|cs| {
            if let Some(console) = CONSOLE.borrow(cs).borrow_mut().as_mut() {
                let _ = write!(console, "[{}] {}\r\n", record.level(), record.args());
            }
        });
    }

    fn flush(&self) {
        interrupt::free(|cs| {
            if let Some(console) = CONSOLE.borrow(cs).borrow_mut().as_mut() {
                console.flush();
            }
        });
    }
}

/// Hand the debug console to the logger and install it.
pub fn init(console: Usart<USART2>) -> Result<(), SetLoggerError> {
    interrupt::free(|cs| *CONSOLE.borrow(cs).borrow_mut() = Some(console));
    log::set_logger(&LOGGER)?;
    log::set_max_level(config::LOG_LEVEL);
    Ok(())
}
