//! Radio transceiver implementations

pub mod sx127x;
// pub mod sx126x;  // Future

pub use sx127x::Sx127x;
