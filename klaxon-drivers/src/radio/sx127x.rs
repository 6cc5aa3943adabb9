//! SX127x LoRa transceiver (SPI)
//!
//! Register-level driver for the Semtech SX1276/77/78/79 family as found
//! on the common RFM95/96 modules. The chip is used in LoRa packet mode
//! with an explicit header and hardware CRC; it sits in continuous receive
//! between transmissions so [`Radio::try_receive`] only has to poll the IRQ
//! flags.
//!
//! # SPI Protocol
//!
//! Every access is one chip-select cycle:
//! - Address byte, MSB set for a write
//! - One or more data bytes (the FIFO register auto-increments)
//!
//! # Transmit
//!
//! [`Radio::send`] loads the FIFO, switches to TX and polls for TX done,
//! bounded by [`TX_TIMEOUT_MS`]. Short frames at SF7/125 kHz take a few tens
//! of milliseconds on air.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Operation, SpiDevice};
use klaxon_hal::{Radio, RadioError, RadioSettings};

/// SX127x register addresses (LoRa mode)
pub mod reg {
    /// FIFO read/write access
    pub const FIFO: u8 = 0x00;
    /// Operating mode and LoRa/FSK selection
    pub const OP_MODE: u8 = 0x01;
    /// Carrier frequency, MSB
    pub const FRF_MSB: u8 = 0x06;
    /// Carrier frequency, middle byte
    pub const FRF_MID: u8 = 0x07;
    /// Carrier frequency, LSB
    pub const FRF_LSB: u8 = 0x08;
    /// PA selection and output power
    pub const PA_CONFIG: u8 = 0x09;
    /// Over-current protection
    pub const OCP: u8 = 0x0B;
    /// LNA gain and boost
    pub const LNA: u8 = 0x0C;
    /// FIFO SPI pointer
    pub const FIFO_ADDR_PTR: u8 = 0x0D;
    /// TX base address in FIFO
    pub const FIFO_TX_BASE_ADDR: u8 = 0x0E;
    /// RX base address in FIFO
    pub const FIFO_RX_BASE_ADDR: u8 = 0x0F;
    /// Start address of the last received packet
    pub const FIFO_RX_CURRENT_ADDR: u8 = 0x10;
    /// IRQ flags (write 1 to clear)
    pub const IRQ_FLAGS: u8 = 0x12;
    /// Length of the last received packet
    pub const RX_NB_BYTES: u8 = 0x13;
    /// RSSI of the last received packet
    pub const PKT_RSSI_VALUE: u8 = 0x1A;
    /// Bandwidth, coding rate, header mode
    pub const MODEM_CONFIG_1: u8 = 0x1D;
    /// Spreading factor, CRC enable
    pub const MODEM_CONFIG_2: u8 = 0x1E;
    /// Payload length for transmission
    pub const PAYLOAD_LENGTH: u8 = 0x22;
    /// Low data rate optimisation, AGC
    pub const MODEM_CONFIG_3: u8 = 0x26;
    /// LoRa detection optimize (SF6 needs a special value)
    pub const DETECTION_OPTIMIZE: u8 = 0x31;
    /// LoRa detection threshold (SF6 needs a special value)
    pub const DETECTION_THRESHOLD: u8 = 0x37;
    /// Silicon revision
    pub const VERSION: u8 = 0x42;
    /// High-power PA DAC
    pub const PA_DAC: u8 = 0x4D;
}

/// Operating modes (OR'ed with [`MODE_LONG_RANGE`])
mod mode {
    pub const SLEEP: u8 = 0x00;
    pub const STANDBY: u8 = 0x01;
    pub const TX: u8 = 0x03;
    pub const RX_CONTINUOUS: u8 = 0x05;
}

/// LoRa mode select bit in OP_MODE
const MODE_LONG_RANGE: u8 = 0x80;

/// IRQ flag bits
mod irq {
    pub const TX_DONE: u8 = 0x08;
    pub const PAYLOAD_CRC_ERROR: u8 = 0x20;
    pub const RX_DONE: u8 = 0x40;
}

/// Expected silicon revision
pub const SX127X_VERSION: u8 = 0x12;

/// FIFO capacity for one packet
pub const FIFO_SIZE: usize = 255;

/// Upper bound on waiting for TX done
pub const TX_TIMEOUT_MS: u32 = 2000;

/// Crystal frequency
const FXOSC_HZ: u64 = 32_000_000;

/// Carriers at or above this use the HF port RSSI offset
const HF_PORT_MIN_HZ: u32 = 779_000_000;

/// Packet RSSI offset on the HF port (dBm)
const RSSI_OFFSET_HF: i16 = -157;
/// Packet RSSI offset on the LF port (dBm)
const RSSI_OFFSET_LF: i16 = -164;

/// Selectable signal bandwidths in Hz, by MODEM_CONFIG_1 code
pub const BANDWIDTHS_HZ: [u32; 10] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
];

/// Symbol time above which low data rate optimisation is required (us)
const LDRO_SYMBOL_US: u64 = 16_000;

/// Compute the 24-bit FRF register value for a carrier frequency
///
/// FRF = f * 2^19 / FXOSC
pub fn frf(frequency_hz: u32) -> u32 {
    ((u64::from(frequency_hz) << 19) / FXOSC_HZ) as u32
}

/// Smallest supported bandwidth code covering `bandwidth_hz`
pub fn bandwidth_code(bandwidth_hz: u32) -> Option<u8> {
    BANDWIDTHS_HZ
        .iter()
        .position(|&bw| bandwidth_hz <= bw)
        .map(|code| code as u8)
}

/// Whether a spreading factor / bandwidth pair needs LDRO
pub fn needs_low_data_rate(spreading_factor: u8, bandwidth_hz: u32) -> bool {
    let symbol_us = (1u64 << spreading_factor) * 1_000_000 / u64::from(bandwidth_hz.max(1));
    symbol_us > LDRO_SYMBOL_US
}

/// OCP register value for a current limit in mA
fn ocp_value(limit_ma: u8) -> u8 {
    let trim = if limit_ma <= 120 {
        (limit_ma.saturating_sub(45)) / 5
    } else if limit_ma <= 240 {
        ((u16::from(limit_ma) + 30) / 10) as u8
    } else {
        27
    };
    0x20 | (trim & 0x1F)
}

/// SX127x driver
///
/// Owns the SPI device (with its chip select), the reset line and a delay
/// source. Nothing touches the chip until [`Radio::configure`].
pub struct Sx127x<SPI, RST, DELAY> {
    spi: SPI,
    reset: RST,
    delay: DELAY,
    frequency_hz: u32,
    last_rssi: i16,
}

impl<SPI, RST, DELAY> Sx127x<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Create a new driver
    pub fn new(spi: SPI, reset: RST, delay: DELAY) -> Self {
        Self {
            spi,
            reset,
            delay,
            frequency_hz: 0,
            last_rssi: 0,
        }
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, RST, DELAY) {
        (self.spi, self.reset, self.delay)
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, RadioError> {
        let mut buf = [addr & 0x7F, 0];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| RadioError::Bus)?;
        Ok(buf[1])
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), RadioError> {
        self.spi
            .write(&[addr | 0x80, value])
            .map_err(|_| RadioError::Bus)
    }

    fn modify_register(&mut self, addr: u8, mask: u8, bits: u8) -> Result<(), RadioError> {
        let value = self.read_register(addr)?;
        self.write_register(addr, (value & !mask) | (bits & mask))
    }

    fn set_mode(&mut self, mode: u8) -> Result<(), RadioError> {
        self.write_register(reg::OP_MODE, MODE_LONG_RANGE | mode)
    }

    fn hard_reset(&mut self) -> Result<(), RadioError> {
        self.reset.set_low().map_err(|_| RadioError::Bus)?;
        self.delay.delay_ms(1);
        self.reset.set_high().map_err(|_| RadioError::Bus)?;
        self.delay.delay_ms(10);
        Ok(())
    }

    fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        let frf = frf(frequency_hz);
        self.write_register(reg::FRF_MSB, (frf >> 16) as u8)?;
        self.write_register(reg::FRF_MID, (frf >> 8) as u8)?;
        self.write_register(reg::FRF_LSB, frf as u8)?;
        self.frequency_hz = frequency_hz;
        Ok(())
    }

    /// Output power on the PA_BOOST pin, 2-20 dBm
    fn set_tx_power(&mut self, dbm: i8) -> Result<(), RadioError> {
        if !(2..=20).contains(&dbm) {
            return Err(RadioError::InvalidConfig);
        }

        let level = if dbm > 17 {
            // +20 dBm mode: high-power DAC, raise the current limit
            self.write_register(reg::PA_DAC, 0x87)?;
            self.write_register(reg::OCP, ocp_value(140))?;
            dbm - 3
        } else {
            self.write_register(reg::PA_DAC, 0x84)?;
            self.write_register(reg::OCP, ocp_value(100))?;
            dbm
        };
        self.write_register(reg::PA_CONFIG, 0x80 | (level - 2) as u8)
    }

    fn set_modem(&mut self, settings: &RadioSettings) -> Result<(), RadioError> {
        let bw = bandwidth_code(settings.bandwidth_hz).ok_or(RadioError::InvalidConfig)?;
        let sf = settings.spreading_factor;
        if !(6..=12).contains(&sf) {
            return Err(RadioError::InvalidConfig);
        }
        if !(5..=8).contains(&settings.coding_rate) {
            return Err(RadioError::InvalidConfig);
        }
        let cr = settings.coding_rate - 4;

        // Bandwidth, coding rate, explicit header
        self.write_register(reg::MODEM_CONFIG_1, (bw << 4) | (cr << 1))?;
        // Spreading factor, CRC on
        self.write_register(reg::MODEM_CONFIG_2, (sf << 4) | 0x04)?;

        let (optimize, threshold) = if sf == 6 { (0xC5, 0x0C) } else { (0xC3, 0x0A) };
        self.write_register(reg::DETECTION_OPTIMIZE, optimize)?;
        self.write_register(reg::DETECTION_THRESHOLD, threshold)?;

        // AGC auto, LDRO when symbols are long
        let ldro = needs_low_data_rate(sf, BANDWIDTHS_HZ[usize::from(bw)]);
        self.write_register(reg::MODEM_CONFIG_3, if ldro { 0x0C } else { 0x04 })
    }

    fn rssi_offset(&self) -> i16 {
        if self.frequency_hz >= HF_PORT_MIN_HZ {
            RSSI_OFFSET_HF
        } else {
            RSSI_OFFSET_LF
        }
    }

    fn wait_tx_done(&mut self) -> Result<(), RadioError> {
        for _ in 0..TX_TIMEOUT_MS {
            if self.read_register(reg::IRQ_FLAGS)? & irq::TX_DONE != 0 {
                return self.write_register(reg::IRQ_FLAGS, irq::TX_DONE);
            }
            self.delay.delay_ms(1);
        }
        Err(RadioError::Timeout)
    }
}

impl<SPI, RST, DELAY> Radio for Sx127x<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    fn configure(&mut self, settings: &RadioSettings) -> Result<(), RadioError> {
        self.hard_reset()?;

        let version = self.read_register(reg::VERSION)?;
        if version != SX127X_VERSION {
            #[cfg(feature = "defmt")]
            defmt::warn!("sx127x: unexpected version {=u8:#x}", version);
            return Err(RadioError::NotFound);
        }

        // LoRa mode can only be selected from sleep
        self.write_register(reg::OP_MODE, mode::SLEEP)?;
        self.set_mode(mode::SLEEP)?;

        self.set_frequency(settings.frequency_hz)?;
        self.write_register(reg::FIFO_TX_BASE_ADDR, 0)?;
        self.write_register(reg::FIFO_RX_BASE_ADDR, 0)?;
        // LNA boost
        self.modify_register(reg::LNA, 0x03, 0x03)?;
        self.set_modem(settings)?;
        self.set_tx_power(settings.tx_power_dbm)?;

        self.set_mode(mode::STANDBY)?;
        self.set_mode(mode::RX_CONTINUOUS)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "sx127x: {=u32} Hz, SF{=u8}, {=i8} dBm",
            settings.frequency_hz,
            settings.spreading_factor,
            settings.tx_power_dbm
        );
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<(), RadioError> {
        if data.len() > FIFO_SIZE {
            return Err(RadioError::PacketTooLarge);
        }

        self.set_mode(mode::STANDBY)?;
        self.write_register(reg::FIFO_ADDR_PTR, 0)?;
        self.spi
            .transaction(&mut [
                Operation::Write(&[reg::FIFO | 0x80]),
                Operation::Write(data),
            ])
            .map_err(|_| RadioError::Bus)?;
        self.write_register(reg::PAYLOAD_LENGTH, data.len() as u8)?;
        self.set_mode(mode::TX)?;

        let result = self.wait_tx_done();
        // Back to listening whatever happened
        self.set_mode(mode::RX_CONTINUOUS)?;
        result
    }

    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, RadioError> {
        let flags = self.read_register(reg::IRQ_FLAGS)?;
        if flags & irq::RX_DONE == 0 {
            return Ok(None);
        }
        self.write_register(reg::IRQ_FLAGS, flags)?;

        if flags & irq::PAYLOAD_CRC_ERROR != 0 {
            return Err(RadioError::Crc);
        }

        let len = usize::from(self.read_register(reg::RX_NB_BYTES)?);
        let dst = buf.get_mut(..len).ok_or(RadioError::PacketTooLarge)?;

        let start = self.read_register(reg::FIFO_RX_CURRENT_ADDR)?;
        self.write_register(reg::FIFO_ADDR_PTR, start)?;
        self.spi
            .transaction(&mut [Operation::Write(&[reg::FIFO]), Operation::Read(dst)])
            .map_err(|_| RadioError::Bus)?;

        let raw = self.read_register(reg::PKT_RSSI_VALUE)?;
        self.last_rssi = self.rssi_offset() + i16::from(raw);
        Ok(Some(len))
    }

    fn last_signal_strength(&self) -> i16 {
        self.last_rssi
    }
}
