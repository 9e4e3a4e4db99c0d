// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(target_os = "none", no_std)]

#[cfg(target_os = "none")]
mod firmware {
    use cortex_m_rt::entry;
    use log::info;
    use panic_halt as _;

    use hal::{
        gpio::PinState,
        pac,
        prelude::*,
        serial::{Config, Serial},
        spi::{Mode, Phase, Polarity, Spi},
    };
    use stm32f7xx_hal as hal;

    use lvprog::config;
    use lvprog::hw::{
        logger, pins::BoardPins, HostLink, IcspBus, Led, Line, PgdTurnaround, SysDelay, Usart,
    };
    use lvprog::{Bridge, IcspEngine};

    /// Data is latched by the target on the falling clock edge.
    const ICSP_MODE: Mode = Mode {
        polarity: Polarity::IdleLow,
        phase: Phase::CaptureOnSecondTransition,
    };

    #[entry]
    fn main() -> ! {
        // Peripherals
        let dp = pac::Peripherals::take().unwrap();
        let cp = cortex_m::Peripherals::take().unwrap();

        // Clocks
        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr.freeze();
        let mut apb2 = rcc.apb2;

        // GPIO
        let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOD);

        // USART2 (DBG)
        let debug_cfg = Config {
            baud_rate: config::DEBUG_BAUD.bps(),
            ..Default::default()
        };
        let debug = Serial::new(dp.USART2, (pins.debug.tx, pins.debug.rx), &clocks, debug_cfg);
        logger::init(Usart::new(debug)).ok();
        info!("{} starting", config::VERSION);

        // USART3 (host link)
        let host_cfg = Config {
            baud_rate: config::HOST_BAUD.bps(),
            ..Default::default()
        };
        let host = Serial::new(dp.USART3, (pins.host.tx, pins.host.rx), &clocks, host_cfg);
        let link = HostLink::new(host);

        // SPI1 (ICSP)
        let spi1 = Spi::new(dp.SPI1, (pins.icsp.sck, pins.icsp.miso, pins.icsp.mosi)).enable::<u8>(
            ICSP_MODE,
            config::ICSP_SPI_HZ.Hz(),
            &clocks,
            &mut apb2,
        );
        let icsp = IcspEngine::new(
            IcspBus::new(spi1),
            PgdTurnaround::new(),
            Line::new(pins.icsp.mclr, PinState::High),
            SysDelay::new(cp.SYST, &clocks),
        );

        let activity = Led::active_high(Line::new(pins.activity, PinState::Low));

        info!("waiting for host");
        Bridge::new(link, icsp, activity).run()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
