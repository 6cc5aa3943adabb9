//! PWM buzzer output
//!
//! A passive piezo driven with a 50% square wave from one PWM channel.
//! The slice counter runs at SYS_CLK / [`PWM_DIVIDER`]; the wrap value
//! sets the frequency:
//!
//! freq = SYS_CLK / (divider * (top + 1))

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use fixed::types::U12F4;
use klaxon_hal::ToneOutput;

/// System clock frequency (default RP2040 configuration)
pub const SYS_CLK_HZ: u32 = 125_000_000;

/// Integer clock divider applied to the slice
pub const PWM_DIVIDER: u32 = 64;

/// Lowest frequency whose wrap value fits in 16 bits
pub const MIN_TONE_HZ: u32 = SYS_CLK_HZ / PWM_DIVIDER / 65_536 + 1;

/// Wrap value for a tone frequency
///
/// Frequencies below [`MIN_TONE_HZ`] are clamped to it; zero is treated
/// the same way.
pub fn pwm_top(frequency_hz: u32) -> u16 {
    let counter_hz = SYS_CLK_HZ / PWM_DIVIDER;
    let frequency_hz = frequency_hz.max(MIN_TONE_HZ);
    (counter_hz / frequency_hz).saturating_sub(1).min(u32::from(u16::MAX)) as u16
}

/// Buzzer on PWM channel B of one slice
pub struct PwmTone<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
}

impl<'d> PwmTone<'d> {
    /// Take a PWM slice configured for channel B output, initially silent
    pub fn new(mut pwm: Pwm<'d>) -> Self {
        let mut config = PwmConfig::default();
        config.divider = U12F4::from_num(PWM_DIVIDER);
        config.compare_b = 0;
        pwm.set_config(&config);
        Self { pwm, config }
    }
}

impl ToneOutput for PwmTone<'_> {
    fn start_tone(&mut self, frequency_hz: u32) {
        let top = pwm_top(frequency_hz);
        self.config.top = top;
        self.config.compare_b = top / 2 + 1;
        self.pwm.set_config(&self.config);
    }

    fn stop_tone(&mut self) {
        self.config.compare_b = 0;
        self.pwm.set_config(&self.config);
    }
}
