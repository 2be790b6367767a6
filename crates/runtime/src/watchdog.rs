use foundation::time::Timestamp;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WatchdogState {
    Idle,
    Armed { deadline: Timestamp },
    Cleared,
    Fired,
}

/// One-shot timeout.
///
/// Once cleared or fired it stays that way; re-arming is only possible from
/// `Idle`.
#[derive(Debug, Clone)]
pub struct Watchdog {
    timeout_ms: i64,
    state: WatchdogState,
}

impl Watchdog {
    pub fn new(timeout_ms: i64) -> Self {
        Self {
            timeout_ms,
            state: WatchdogState::Idle,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, WatchdogState::Armed { .. })
    }

    pub fn arm(&mut self, now: Timestamp) -> bool {
        if self.state != WatchdogState::Idle {
            return false;
        }
        self.state = WatchdogState::Armed {
            deadline: now.plus_ms(self.timeout_ms),
        };
        true
    }

    /// Disarms without firing. Returns true if it was armed.
    pub fn clear(&mut self) -> bool {
        if self.is_armed() {
            self.state = WatchdogState::Cleared;
            return true;
        }
        false
    }

    /// Fires immediately if armed (e.g. on an early error signal).
    pub fn trip(&mut self) -> bool {
        if self.is_armed() {
            self.state = WatchdogState::Fired;
            return true;
        }
        false
    }

    /// Fires if the deadline has passed. Returns true exactly once.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        match self.state {
            WatchdogState::Armed { deadline } if now >= deadline => {
                self.state = WatchdogState::Fired;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Watchdog, WatchdogState};
    use foundation::time::Timestamp;

    #[test]
    fn fires_once_after_deadline() {
        let mut w = Watchdog::new(10_000);
        assert!(w.arm(Timestamp(0)));
        assert!(!w.poll(Timestamp(9_999)));
        assert!(w.poll(Timestamp(10_000)));
        assert!(!w.poll(Timestamp(20_000)));
        assert_eq!(w.state(), WatchdogState::Fired);
    }

    #[test]
    fn clear_prevents_firing() {
        let mut w = Watchdog::new(10);
        w.arm(Timestamp(0));
        assert!(w.clear());
        assert!(!w.poll(Timestamp(100)));
        assert!(!w.trip());
        assert!(!w.arm(Timestamp(200)));
    }

    #[test]
    fn trip_fires_early() {
        let mut w = Watchdog::new(10_000);
        assert!(!w.trip());
        w.arm(Timestamp(0));
        assert!(w.trip());
        assert!(!w.poll(Timestamp(10_000)));
    }
}
