use chrono::{Duration, Utc};
use eegsync::core::{PlaybackInfo, PlaybackSnapshot, Transition};
use eegsync::engine::TransitionDetector;

fn playing(uri: &str) -> PlaybackSnapshot {
    PlaybackInfo::new(uri, uri.to_uppercase()).into()
}

fn names(detector: &mut TransitionDetector, snapshots: Vec<PlaybackSnapshot>) -> Vec<&'static str> {
    let t0 = Utc::now();
    snapshots
        .into_iter()
        .enumerate()
        .filter_map(|(i, snapshot)| detector.observe(snapshot, t0 + Duration::seconds(i as i64)))
        .map(|event| event.transition.name())
        .collect()
}

#[test]
fn test_identical_snapshots_fire_once() {
    let mut detector = TransitionDetector::new(0);

    let fired = names(&mut detector, vec![playing("a"); 10]);
    assert_eq!(fired, vec!["started"]);

    let fired = names(&mut detector, vec![PlaybackSnapshot::Empty; 2]);
    assert_eq!(fired, vec!["stopped"]);

    let fired = names(&mut detector, vec![PlaybackSnapshot::Empty; 5]);
    assert!(fired.is_empty());
}

#[test]
fn test_change_stop_start_sequence() {
    let mut detector = TransitionDetector::new(0);
    detector.observe(playing("a"), Utc::now());

    let t0 = Utc::now();
    let sequence = vec![
        playing("a"),
        playing("a"),
        playing("b"),
        playing("b"),
        PlaybackSnapshot::Empty,
        PlaybackSnapshot::Empty,
        playing("c"),
    ];

    let events: Vec<_> = sequence
        .into_iter()
        .enumerate()
        .filter_map(|(i, snapshot)| detector.observe(snapshot, t0 + Duration::seconds(i as i64)))
        .collect();

    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0].transition,
        Transition::Changed {
            old: PlaybackInfo::new("a", "A"),
            new: PlaybackInfo::new("b", "B"),
        }
    );
    assert_eq!(events[0].timestamp, t0 + Duration::seconds(2));
    assert_eq!(
        events[1].transition,
        Transition::Stopped {
            old: PlaybackInfo::new("b", "B"),
        }
    );
    assert_eq!(events[1].timestamp, t0 + Duration::seconds(4));
    assert_eq!(
        events[2].transition,
        Transition::Started {
            new: PlaybackInfo::new("c", "C"),
        }
    );
}

#[test]
fn test_debounce_suppresses_short_gap() {
    let mut detector = TransitionDetector::new(1);

    let fired = names(&mut detector, vec![playing("a"), PlaybackSnapshot::Empty, playing("a")]);
    assert_eq!(fired, vec!["started"]);
    assert_eq!(detector.previous().identity(), Some("a"));
}

#[test]
fn test_debounced_stop_carries_first_empty_time() {
    let mut detector = TransitionDetector::new(1);
    let t0 = Utc::now();

    assert!(detector.observe(playing("a"), t0).is_some());
    assert!(detector
        .observe(PlaybackSnapshot::Empty, t0 + Duration::seconds(1))
        .is_none());

    let event = detector
        .observe(PlaybackSnapshot::Empty, t0 + Duration::seconds(2))
        .unwrap();
    assert_eq!(
        event.transition,
        Transition::Stopped {
            old: PlaybackInfo::new("a", "A"),
        }
    );
    assert_eq!(event.timestamp, t0 + Duration::seconds(1));
}
