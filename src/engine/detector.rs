use crate::core::{PlaybackSnapshot, Transition, TransitionEvent};
use chrono::{DateTime, Utc};

/// Turns a sequence of playback snapshots into transition events.
///
/// With `stop_debounce = n`, a `Stopped` transition is only reported after
/// `n` further consecutive empty polls; it carries the time of the first
/// empty poll. If the same item comes back within that window nothing is
/// reported, and a different item is reported as `Changed`.
#[derive(Debug, Default)]
pub struct TransitionDetector {
    previous: PlaybackSnapshot,
    stop_debounce: u32,
    absent_polls: u32,
    first_absent_at: Option<DateTime<Utc>>,
}

impl TransitionDetector {
    pub fn new(stop_debounce: u32) -> Self {
        Self {
            stop_debounce,
            ..Self::default()
        }
    }

    /// Last confirmed snapshot
    pub fn previous(&self) -> &PlaybackSnapshot {
        &self.previous
    }

    /// Feed one poll result observed at `now`
    pub fn observe(&mut self, current: PlaybackSnapshot, now: DateTime<Utc>) -> Option<TransitionEvent> {
        if current.is_empty() && !self.previous.is_empty() {
            self.absent_polls += 1;
            let first_absent_at = *self.first_absent_at.get_or_insert(now);

            if self.absent_polls <= self.stop_debounce {
                return None;
            }

            self.reset_absence();
            let transition = Transition::between(&self.previous, &current);
            self.previous = current;
            return transition.map(|t| TransitionEvent::new(t, first_absent_at));
        }

        self.reset_absence();
        let transition = Transition::between(&self.previous, &current);
        self.previous = current;
        transition.map(|t| TransitionEvent::new(t, now))
    }

    fn reset_absence(&mut self) {
        self.absent_polls = 0;
        self.first_absent_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlaybackInfo;
    use chrono::Duration;

    fn playing(uri: &str) -> PlaybackSnapshot {
        PlaybackInfo::new(uri, uri).into()
    }

    #[test]
    fn test_same_item_twice_is_silent() {
        let mut detector = TransitionDetector::new(0);
        let t0 = Utc::now();

        assert!(detector.observe(playing("a"), t0).is_some());
        assert!(detector.observe(playing("a"), t0).is_none());
    }

    #[test]
    fn test_debounced_stop_uses_first_absent_time() {
        let mut detector = TransitionDetector::new(2);
        let t0 = Utc::now();

        detector.observe(playing("a"), t0);
        assert!(detector.observe(PlaybackSnapshot::Empty, t0 + Duration::seconds(1)).is_none());
        assert!(detector.observe(PlaybackSnapshot::Empty, t0 + Duration::seconds(2)).is_none());

        let event = detector
            .observe(PlaybackSnapshot::Empty, t0 + Duration::seconds(3))
            .unwrap();
        assert_eq!(event.transition.name(), "stopped");
        assert_eq!(event.timestamp, t0 + Duration::seconds(1));
        assert!(detector.previous().is_empty());
    }

    #[test]
    fn test_blip_of_same_item_is_ignored() {
        let mut detector = TransitionDetector::new(1);
        let t0 = Utc::now();

        detector.observe(playing("a"), t0);
        assert!(detector.observe(PlaybackSnapshot::Empty, t0).is_none());
        assert!(detector.observe(playing("a"), t0).is_none());
        assert!(detector.observe(PlaybackSnapshot::Empty, t0).is_none());
    }

    #[test]
    fn test_other_item_after_blip_is_a_change() {
        let mut detector = TransitionDetector::new(1);
        let t0 = Utc::now();

        detector.observe(playing("a"), t0);
        detector.observe(PlaybackSnapshot::Empty, t0);
        let event = detector.observe(playing("b"), t0).unwrap();
        assert_eq!(event.transition.name(), "changed");
    }
}
