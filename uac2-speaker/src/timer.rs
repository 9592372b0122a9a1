//! Millisecond interval timer for the cooperative loop.

/// Fires at most once per `poll` when `period_ms` has elapsed since the last
/// scheduled fire.
///
/// The next deadline is the previous one plus the period, not "now plus the
/// period", so a late poll does not push later ticks back. A loop that was
/// busy for several periods catches up one tick per poll. Timestamps wrap.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: u32,
    last_ms: u32,
}

impl Interval {
    pub const fn new(period_ms: u32) -> Self {
        Interval {
            period_ms,
            last_ms: 0,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Change the period. The schedule stays anchored to the last fire.
    pub fn set_period_ms(&mut self, period_ms: u32) {
        self.period_ms = period_ms;
    }

    /// Returns `true` if a tick is due at `now_ms`, and consumes it.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) >= self.period_ms {
            self.last_ms = self.last_ms.wrapping_add(self.period_ms);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_period() {
        let mut t = Interval::new(50);
        assert!(!t.poll(10));
        assert!(!t.poll(49));
        assert!(t.poll(50));
        assert!(!t.poll(60));
        assert!(t.poll(100));
    }

    #[test]
    fn late_poll_does_not_drift() {
        let mut t = Interval::new(50);
        assert!(t.poll(70)); // 20 ms late
        // next deadline is still 100, not 120
        assert!(t.poll(100));
    }

    #[test]
    fn catches_up_one_tick_per_poll() {
        let mut t = Interval::new(50);
        assert!(t.poll(175));
        assert!(t.poll(175));
        assert!(t.poll(175));
        assert!(!t.poll(175));
    }

    #[test]
    fn survives_wraparound() {
        let mut t = Interval::new(50);
        t.last_ms = u32::MAX - 10;
        assert!(!t.poll(u32::MAX));
        assert!(t.poll(39)); // 50 ms after u32::MAX - 10
    }
}
