//! Millisecond timestamps
//!
//! The loop driver supplies a free-running `u32` millisecond clock. All
//! interval checks use wrapping subtraction so the ~49 day rollover is
//! harmless.

/// Milliseconds since boot, wrapping
pub type Millis = u32;

/// Time elapsed from `since` to `now`
pub fn elapsed(now: Millis, since: Millis) -> u32 {
    now.wrapping_sub(since)
}

/// Periodic timer check
///
/// Returns true and restarts the timer when `interval` has passed since
/// the last firing. An unset timer fires immediately.
pub fn due(last: &mut Option<Millis>, now: Millis, interval: u32) -> bool {
    match *last {
        Some(at) if elapsed(now, at) < interval => false,
        _ => {
            *last = Some(now);
            true
        }
    }
}
