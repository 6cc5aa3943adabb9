//! Buzzer output

/// Square-wave tone output (piezo buzzer)
///
/// Both calls must return immediately; timing is the caller's job.
pub trait ToneOutput {
    /// Start (or retune) a continuous tone at `frequency_hz`
    fn start_tone(&mut self, frequency_hz: u32);

    /// Silence the output
    fn stop_tone(&mut self);
}
