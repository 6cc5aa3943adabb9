//! Klaxon - Panic-Button Firmware
//!
//! Main firmware binary for RP2040-based panic-button stations. Each
//! station has five buttons, a buzzer, a 16x2 LCD and an SX127x LoRa
//! transceiver, and talks to its peer over a short ASCII frame protocol.
//!
//! All behaviour lives in [`klaxon_core::Device`]; this binary only wires
//! the board up and runs the loop.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::spi::{Config as SpiConfig, Spi};
use embassy_time::{Delay, Instant, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use {defmt_rtt as _, panic_probe as _};

use klaxon_core::Device;
use klaxon_drivers::display::{Hd44780, PCF8574_ADDR};
use klaxon_drivers::radio::Sx127x;
use klaxon_hal_rp2040::button::{self, Button};
use klaxon_hal_rp2040::{FlashEeprom, PwmTone};

mod config;

/// LCD bus speed
const I2C_FREQUENCY_HZ: u32 = 100_000;

/// Radio SPI clock
const SPI_FREQUENCY_HZ: u32 = 1_000_000;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Klaxon firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();

    // Buttons, in slot order: decrease, beep, naming, transmit, panic
    let buttons = [
        Button::new(p.PIN_10),
        Button::new(p.PIN_11),
        Button::new(p.PIN_12),
        Button::new(p.PIN_13),
        Button::new(p.PIN_14),
    ];

    // Buzzer on GPIO15 (PWM slice 7, channel B)
    let pwm = Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, PwmConfig::default());
    let tone = PwmTone::new(pwm);

    // LCD: I2C0 on GPIO4 (SDA) / GPIO5 (SCL)
    let mut i2c_config = I2cConfig::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);
    let mut lcd = Hd44780::new(i2c, Delay, PCF8574_ADDR);
    match lcd.init() {
        Ok(()) => info!("LCD initialized"),
        Err(e) => warn!("LCD init failed: {}", e),
    }

    // Radio: SPI0 on GPIO18 (SCK) / GPIO19 (MOSI) / GPIO16 (MISO),
    // CS on GPIO17, reset on GPIO20
    let mut spi_config = SpiConfig::default();
    spi_config.frequency = SPI_FREQUENCY_HZ;
    let spi_bus = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let radio = match ExclusiveDevice::new_no_delay(spi_bus, cs) {
        Ok(spi) => {
            let reset = Output::new(p.PIN_20, Level::High);
            Some(Sx127x::new(spi, reset, Delay))
        }
        Err(_) => {
            warn!("Radio chip select unavailable");
            None
        }
    };

    // Name storage in the last 64KB of flash
    let store = FlashEeprom::new(p.FLASH, p.DMA_CH0).await;

    let mut device = Device::new(config, lcd, radio, tone, store);
    device.boot(now_ms());
    info!("Boot complete, link {}", device.status());

    loop {
        device.tick(now_ms(), button::sample(&buttons));

        if device.store_mut().needs_flush() {
            let result = device.store_mut().flush().await;
            if let Err(e) = result {
                warn!("Name flush failed: {}", e);
                device.report_save_failure(now_ms());
            }
        }

        Timer::after_millis(1).await;
    }
}

/// Milliseconds since boot, wrapping at u32
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
