//! Received signal strength to link-quality percentage

/// Readings at or below this map to 0%
pub const RSSI_FLOOR_DBM: i16 = -120;

/// Readings at or above this map to 100%
pub const RSSI_CEILING_DBM: i16 = -30;

/// Map an RSSI reading (dBm) linearly onto 0..=100
pub fn signal_percent(rssi_dbm: i16) -> u8 {
    let clamped = rssi_dbm.clamp(RSSI_FLOOR_DBM, RSSI_CEILING_DBM) as i32;
    let span = (RSSI_CEILING_DBM - RSSI_FLOOR_DBM) as i32;
    ((clamped - RSSI_FLOOR_DBM as i32) * 100 / span) as u8
}
