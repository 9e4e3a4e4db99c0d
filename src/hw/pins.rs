// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F767ZI Nucleo-144 programmer board.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpiod, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

pub struct BoardPins {
    /// LD2, lit while a command runs.
    pub activity: gpiob::PB7<Output<PushPull>>,
    pub host: Usart3Pins,
    pub debug: Usart2Pins,
    pub icsp: IcspPins,
}

/// ST-LINK virtual COM port
pub struct Usart3Pins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// SPI1 clock and both data lines, plus MCLR. MISO and MOSI are tied together at PGD.
pub struct IcspPins {
    pub sck: gpioa::PA5<Alternate<5>>,  // PGC
    pub miso: gpioa::PA6<Alternate<5>>, // PGD in
    pub mosi: gpioa::PA7<Alternate<5>>, // PGD out
    pub mclr: gpiod::PD14<Output<PushPull>>,
}

impl BoardPins {
    pub fn new(gpioa: pac::GPIOA, gpiob: pac::GPIOB, gpiod: pac::GPIOD) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpiod = gpiod.split();

        Self {
            activity: gpiob.pb7.into_push_pull_output(),

            host: Usart3Pins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },

            debug: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            icsp: IcspPins {
                sck: gpioa.pa5.into_alternate::<5>(),
                miso: gpioa.pa6.into_alternate::<5>(),
                mosi: gpioa.pa7.into_alternate::<5>(),
                mclr: gpiod.pd14.into_push_pull_output(),
            },
        }
    }
}
