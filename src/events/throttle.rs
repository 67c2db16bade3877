//! Rate limiting for progress events.

use std::time::{Duration, Instant};

use super::{Event, EventSender, PhaseProgress, ScanEvent, ScanPhase};

/// Rate-limits progress events to roughly ten per second.
///
/// The final update of a phase (`current == total`) is always emitted so
/// consumers see the bar reach 100%.
pub struct ProgressThrottle {
    min_interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    /// Create a throttle with the default ~10 updates/second cadence
    pub fn new() -> Self {
        Self::with_interval(Duration::from_millis(100))
    }

    /// Create a throttle with a custom minimum interval between updates
    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: None,
        }
    }

    /// Emit a progress event if enough time has passed since the last one.
    ///
    /// Returns true if the event was sent.
    pub fn emit(
        &mut self,
        events: &EventSender,
        phase: ScanPhase,
        current: usize,
        total: usize,
    ) -> bool {
        let now = Instant::now();
        let is_final = current >= total;
        let due = match self.last_emit {
            Some(last) => now.duration_since(last) >= self.min_interval,
            None => true,
        };

        if !is_final && !due {
            return false;
        }

        events.send(Event::Scan(ScanEvent::Progress(PhaseProgress {
            phase,
            current,
            total,
        })));
        self.last_emit = Some(now);
        true
    }

    /// Forget the last emit time, e.g. when a new phase starts
    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;

    #[test]
    fn first_update_is_emitted() {
        let (sender, receiver) = EventChannel::new();
        let mut throttle = ProgressThrottle::new();

        assert!(throttle.emit(&sender, ScanPhase::Blur, 1, 100));
        assert!(receiver.try_recv().is_some());
    }

    #[test]
    fn rapid_updates_are_suppressed() {
        let (sender, receiver) = EventChannel::new();
        let mut throttle = ProgressThrottle::with_interval(Duration::from_secs(3600));

        assert!(throttle.emit(&sender, ScanPhase::Blur, 1, 100));
        assert!(!throttle.emit(&sender, ScanPhase::Blur, 2, 100));
        assert!(!throttle.emit(&sender, ScanPhase::Blur, 3, 100));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn final_update_always_emitted() {
        let (sender, receiver) = EventChannel::new();
        let mut throttle = ProgressThrottle::with_interval(Duration::from_secs(3600));

        assert!(throttle.emit(&sender, ScanPhase::Blur, 1, 100));
        assert!(throttle.emit(&sender, ScanPhase::Blur, 100, 100));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
    }

    #[test]
    fn reset_allows_immediate_emit() {
        let (sender, _receiver) = EventChannel::new();
        let mut throttle = ProgressThrottle::with_interval(Duration::from_secs(3600));

        assert!(throttle.emit(&sender, ScanPhase::Blur, 1, 100));
        throttle.reset();
        assert!(throttle.emit(&sender, ScanPhase::Duplicate, 1, 100));
    }
}
