//! Packet radio abstractions
//!
//! The link is a best-effort broadcast: no addressing, no acknowledgement.
//! Implementations transmit whole packets and poll for received ones.

/// Largest packet the core will send or accept
pub const MAX_PACKET_LEN: usize = 64;

/// Errors from radio operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Transceiver did not answer with the expected silicon version
    NotFound,
    /// SPI (or other bus) transfer failed
    Bus,
    /// Requested modem setting is outside the chip's range
    InvalidConfig,
    /// Transmission did not complete in time
    Timeout,
    /// Packet exceeds the FIFO or the caller's buffer
    PacketTooLarge,
    /// Received packet failed its CRC
    Crc,
}

/// LoRa modem settings applied at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadioSettings {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Transmit power in dBm
    pub tx_power_dbm: i8,
    /// Signal bandwidth in Hz
    pub bandwidth_hz: u32,
    /// Spreading factor (6-12)
    pub spreading_factor: u8,
    /// Coding rate denominator (5-8, meaning 4/5..4/8)
    pub coding_rate: u8,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 915_000_000,
            tx_power_dbm: 17,
            bandwidth_hz: 125_000,
            spreading_factor: 7,
            coding_rate: 5,
        }
    }
}

/// Packet transceiver
pub trait Radio {
    /// Apply modem settings and enter receive mode
    fn configure(&mut self, settings: &RadioSettings) -> Result<(), RadioError>;

    /// Broadcast one packet (fire-and-forget)
    fn send(&mut self, data: &[u8]) -> Result<(), RadioError>;

    /// Poll for a received packet
    ///
    /// Returns `Ok(Some(len))` with the packet copied into `buf`, or
    /// `Ok(None)` when nothing is pending.
    fn try_receive(&mut self, buf: &mut [u8]) -> Result<Option<usize>, RadioError>;

    /// Signal strength (dBm) of the most recently received packet
    fn last_signal_strength(&self) -> i16;
}
