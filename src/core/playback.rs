use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of the item the player reports as current
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    pub artists: String,
    pub song: String,

    /// Stable identity of the item (e.g. a track URI)
    pub uri: String,

    pub popularity: u32,
    pub album: String,
    pub released: String,

    /// Item length in seconds
    pub duration: u64,

    /// Position within the item in seconds, at poll time
    pub progress: u64,
}

impl PlaybackInfo {
    pub fn new(uri: impl Into<String>, song: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            song: song.into(),
            ..Self::default()
        }
    }

    /// Two snapshots describe the same item iff their identities match
    pub fn same_item(&self, other: &PlaybackInfo) -> bool {
        self.uri == other.uri
    }
}

/// Result of one poll of the player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "item", rename_all = "lowercase")]
pub enum PlaybackSnapshot {
    /// Nothing is playing (or the player could not be queried)
    #[default]
    Empty,
    Playing(PlaybackInfo),
}

impl PlaybackSnapshot {
    pub fn identity(&self) -> Option<&str> {
        self.info().map(|info| info.uri.as_str())
    }

    pub fn info(&self) -> Option<&PlaybackInfo> {
        match self {
            Self::Empty => None,
            Self::Playing(info) => Some(info),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<Option<PlaybackInfo>> for PlaybackSnapshot {
    fn from(info: Option<PlaybackInfo>) -> Self {
        info.map_or(Self::Empty, Self::Playing)
    }
}

impl From<PlaybackInfo> for PlaybackSnapshot {
    fn from(info: PlaybackInfo) -> Self {
        Self::Playing(info)
    }
}

/// Change between two consecutive, distinct snapshots
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Started { new: PlaybackInfo },
    Stopped { old: PlaybackInfo },
    Changed { old: PlaybackInfo, new: PlaybackInfo },
}

impl Transition {
    /// Classify the move from `previous` to `current`.
    ///
    /// Returns `None` when both are empty or both describe the same item.
    pub fn between(previous: &PlaybackSnapshot, current: &PlaybackSnapshot) -> Option<Self> {
        use PlaybackSnapshot::*;

        match (previous, current) {
            (Empty, Empty) => None,
            (Empty, Playing(new)) => Some(Self::Started { new: new.clone() }),
            (Playing(old), Empty) => Some(Self::Stopped { old: old.clone() }),
            (Playing(old), Playing(new)) if old.same_item(new) => None,
            (Playing(old), Playing(new)) => Some(Self::Changed {
                old: old.clone(),
                new: new.clone(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Stopped { .. } => "stopped",
            Self::Changed { .. } => "changed",
        }
    }
}

/// A detected transition and the wall-clock time it was observed
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEvent {
    pub transition: Transition,
    pub timestamp: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn new(transition: Transition, timestamp: DateTime<Utc>) -> Self {
        Self {
            transition,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(uri: &str) -> PlaybackSnapshot {
        PlaybackInfo::new(uri, uri).into()
    }

    #[test]
    fn test_empty_to_empty_is_not_a_transition() {
        assert_eq!(Transition::between(&PlaybackSnapshot::Empty, &PlaybackSnapshot::Empty), None);
    }

    #[test]
    fn test_same_identity_is_not_a_transition() {
        let mut later = PlaybackInfo::new("spotify:track:123", "Test track");
        later.progress = 42;
        assert_eq!(Transition::between(&playing("spotify:track:123"), &later.into()), None);
    }

    #[test]
    fn test_classification() {
        let a = playing("a");
        let b = playing("b");
        let empty = PlaybackSnapshot::Empty;

        assert_eq!(Transition::between(&empty, &a).map(|t| t.name()), Some("started"));
        assert_eq!(Transition::between(&a, &empty).map(|t| t.name()), Some("stopped"));
        assert_eq!(Transition::between(&a, &b).map(|t| t.name()), Some("changed"));
    }

    #[test]
    fn test_snapshot_serializes_tagged() {
        let json = serde_json::to_value(&PlaybackSnapshot::Empty).unwrap();
        assert_eq!(json, serde_json::json!({"state": "empty"}));

        let json = serde_json::to_value(playing("x")).unwrap();
        assert_eq!(json["state"], "playing");
        assert_eq!(json["item"]["uri"], "x");
    }
}
