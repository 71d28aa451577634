use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named timestamps recorded while an epoch is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochMarkers {
    /// Playback of the epoch's item was first observed
    pub start: Option<DateTime<Utc>>,

    /// Playback stopped or moved on to another item
    pub end: Option<DateTime<Utc>>,

    /// Most recent label assignment
    pub labeling: Option<DateTime<Utc>>,
}

impl EpochMarkers {
    /// Fresh markers for an epoch that begins at `start`
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            ..Self::default()
        }
    }

    /// An epoch is open once it has a start and until it gets an end
    pub fn is_open(&self) -> bool {
        self.start.is_some() && self.end.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markers_are_closed() {
        let markers = EpochMarkers::default();
        assert!(!markers.is_open());
        assert_eq!(markers.start, None);
        assert_eq!(markers.end, None);
        assert_eq!(markers.labeling, None);
    }

    #[test]
    fn test_open_until_end_is_stamped() {
        let now = Utc::now();
        let mut markers = EpochMarkers::starting_at(now);
        assert!(markers.is_open());

        markers.end = Some(now);
        assert!(!markers.is_open());
    }
}
