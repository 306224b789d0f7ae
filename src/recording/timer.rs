//! Scheduling primitives driven by the UI loop.
//!
//! Neither primitive spawns anything: the owner polls them with the current
//! time (or once per frame), which keeps every callback on the UI thread and
//! lets tests drive them with synthetic instants.

use std::time::{Duration, Instant};

/// A repeating interval that fires at most once per poll.
#[derive(Debug)]
pub struct IntervalTimer {
    period: Duration,
    next_deadline: Option<Instant>,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_deadline: None,
        }
    }

    /// Arms the interval; the first tick is due one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_deadline = Some(now + self.period);
    }

    pub fn clear(&mut self) {
        self.next_deadline = None;
    }

    #[cfg(test)]
    pub fn is_armed(&self) -> bool {
        self.next_deadline.is_some()
    }

    /// Returns true if a tick is due at `now`, and schedules the following one.
    ///
    /// Ticks missed by a late poll are delivered by subsequent polls, one each.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_deadline {
            Some(deadline) if now >= deadline => {
                self.next_deadline = Some(deadline + self.period);
                true
            }
            _ => false,
        }
    }
}

/// A pending request for one animation frame.
#[derive(Debug, Default)]
pub struct AnimationFrame {
    requested: bool,
}

impl AnimationFrame {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn cancel(&mut self) {
        self.requested = false;
    }

    #[cfg(test)]
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Consumes the pending request; the frame callback must request again to keep running.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_fires_once_per_period() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        assert!(!timer.poll(t0 + Duration::from_secs(5)));

        timer.start(t0);
        assert!(!timer.poll(t0 + Duration::from_millis(999)));
        assert!(timer.poll(t0 + Duration::from_secs(1)));
        assert!(!timer.poll(t0 + Duration::from_millis(1500)));

        // A late poll catches up one tick at a time
        let late = t0 + Duration::from_secs(4);
        let mut fired = 0;
        while timer.poll(late) {
            fired += 1;
        }
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_cleared_interval_never_fires() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::new(Duration::from_secs(1));
        timer.start(t0);
        timer.clear();
        assert!(!timer.is_armed());
        assert!(!timer.poll(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn test_animation_frame_is_one_shot() {
        let mut frame = AnimationFrame::default();
        assert!(!frame.take());
        frame.request();
        assert!(frame.take());
        assert!(!frame.is_requested());

        frame.request();
        frame.cancel();
        assert!(!frame.take());
    }
}
