//! Held-key repeat emulation over an edge-triggered native key stream.
//!
//! The platform tags key-down records it generated for a held key with a
//! repeat flag. This filter suppresses or passes those records so the
//! surfaced cadence follows the configured delay/interval instead of the
//! platform's own timing. Both the blocking and the non-blocking read paths
//! run every candidate record through the same instance.

use crate::error::EventError;
use crate::native::NativeEvent;

/// Repeat timing state. Delay is the hold time before the first emulated
/// repeat; interval is the spacing afterwards. Both zero means repeat is
/// disabled and platform repeat records never surface.
#[derive(Debug, Default)]
pub struct KeyRepeat {
    delay: i32,
    interval: i32,
    first_pending: bool,
    last_timestamp: u32,
}

impl KeyRepeat {
    /// Disabled filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set delay and interval in milliseconds.
    ///
    /// Negative values are a configuration error and leave the previous
    /// settings and timing state untouched. Success resets the timing state.
    pub fn configure(&mut self, delay: i32, interval: i32) -> Result<(), EventError> {
        if delay < 0 || interval < 0 {
            return Err(EventError::Configuration);
        }
        self.delay = delay;
        self.interval = interval;
        self.first_pending = false;
        self.last_timestamp = 0;
        Ok(())
    }

    /// Current `(delay, interval)` settings.
    pub fn settings(&self) -> (i32, i32) {
        (self.delay, self.interval)
    }

    fn enabled(&self) -> bool {
        self.delay > 0 || self.interval > 0
    }

    /// Decide whether `event` surfaces to the consumer.
    ///
    /// Non-key-down records always pass. A fresh (non-repeat) key-down
    /// passes and arms the first-repeat delay. Repeat-flagged records are
    /// suppressed entirely while disabled; while enabled they surface once
    /// the delay elapses and then on every interval boundary.
    pub fn should_pass(&mut self, event: &NativeEvent) -> bool {
        let Some((timestamp, repeat)) = event.key_repeat() else {
            return true;
        };

        if !repeat {
            if self.enabled() {
                self.first_pending = true;
                self.last_timestamp = timestamp;
            }
            return true;
        }

        if !self.enabled() {
            return false;
        }

        if !self.first_pending && self.last_timestamp == 0 {
            // Repeat stream with no observed fresh key-down (the key was
            // already held when we started filtering): arm from here.
            self.first_pending = true;
            self.last_timestamp = timestamp;
        }

        if self.first_pending {
            if timestamp.wrapping_sub(self.last_timestamp) >= self.delay as u32 {
                self.first_pending = false;
                self.last_timestamp = timestamp;
                true
            } else {
                false
            }
        } else if timestamp.wrapping_sub(self.last_timestamp) >= self.interval as u32 {
            self.last_timestamp = timestamp;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
