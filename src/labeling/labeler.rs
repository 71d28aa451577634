use std::collections::BTreeMap;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::core::PlaybackSnapshot;
use super::{PlaylistSink, SinkError};

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("no playlist is mapped to label '{0}'")]
    UnmappedLabel(String),

    #[error("playlist '{0}' is not known")]
    UnknownPlaylist(String),

    #[error("nothing is playing")]
    NothingPlaying,

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Playlist as listed by the playback service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
    pub ntracks: u64,
}

/// Adds labeled items to the playlist configured for their label
pub struct PlaylistLabeler {
    labels_to_playlists: BTreeMap<String, String>,
    playlists: BTreeMap<String, PlaylistRef>,
    sink: Arc<dyn PlaylistSink>,
}

impl PlaylistLabeler {
    /// `labels_to_playlists` maps label to playlist name, `playlists` maps
    /// playlist name to its reference
    pub fn new(
        labels_to_playlists: BTreeMap<String, String>,
        playlists: BTreeMap<String, PlaylistRef>,
        sink: Arc<dyn PlaylistSink>,
    ) -> Self {
        Self {
            labels_to_playlists,
            playlists,
            sink,
        }
    }

    /// Labels that have a playlist mapping
    pub fn labels(&self) -> Vec<String> {
        self.labels_to_playlists.keys().cloned().collect()
    }

    /// Playlist reference for `label`
    pub fn resolve(&self, label: &str) -> Result<&PlaylistRef, LabelError> {
        let name = self
            .labels_to_playlists
            .get(label)
            .ok_or_else(|| LabelError::UnmappedLabel(label.to_string()))?;

        self.playlists
            .get(name)
            .ok_or_else(|| LabelError::UnknownPlaylist(name.clone()))
    }

    /// Add the item in `snapshot` to the playlist for `label`; returns the
    /// playlist id
    pub async fn add_current(&self, label: &str, snapshot: &PlaybackSnapshot) -> Result<String, LabelError> {
        let item = snapshot.info().ok_or(LabelError::NothingPlaying)?;
        let playlist = self.resolve(label)?;

        log::debug!("Adding {} to playlist {}", item.song, playlist.id);
        self.sink.add_item(&playlist.id, &item.uri).await?;
        Ok(playlist.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlaybackInfo;
    use crate::labeling::RecordingPlaylistSink;

    fn labeler(sink: Arc<RecordingPlaylistSink>) -> PlaylistLabeler {
        let labels = BTreeMap::from([
            ("like".to_string(), "EEG-Liked".to_string()),
            ("meh".to_string(), "EEG-Meh".to_string()),
        ]);
        let playlists = BTreeMap::from([(
            "EEG-Liked".to_string(),
            PlaylistRef {
                id: "pl1".to_string(),
                ntracks: 3,
            },
        )]);
        PlaylistLabeler::new(labels, playlists, sink)
    }

    #[tokio::test]
    async fn test_adds_current_item() {
        let sink = Arc::new(RecordingPlaylistSink::new());
        let labeler = labeler(Arc::clone(&sink));
        let snapshot: PlaybackSnapshot = PlaybackInfo::new("uri:a", "A").into();

        let id = labeler.add_current("like", &snapshot).await.unwrap();

        assert_eq!(id, "pl1");
        assert_eq!(sink.added(), vec![("pl1".to_string(), "uri:a".to_string())]);
    }

    #[tokio::test]
    async fn test_resolution_errors() {
        let sink = Arc::new(RecordingPlaylistSink::new());
        let labeler = labeler(sink);
        let snapshot: PlaybackSnapshot = PlaybackInfo::new("uri:a", "A").into();

        assert!(matches!(
            labeler.add_current("hate", &snapshot).await,
            Err(LabelError::UnmappedLabel(_))
        ));
        assert!(matches!(
            labeler.add_current("meh", &snapshot).await,
            Err(LabelError::UnknownPlaylist(_))
        ));
        assert!(matches!(
            labeler.add_current("like", &PlaybackSnapshot::Empty).await,
            Err(LabelError::NothingPlaying)
        ));
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported() {
        let sink = Arc::new(RecordingPlaylistSink::new());
        sink.fail_with(SinkError::Http {
            status: 403,
            body: "forbidden".to_string(),
        });
        let labeler = labeler(sink);

        let result = labeler
            .add_current("like", &PlaybackInfo::new("uri:a", "A").into())
            .await;
        assert!(matches!(result, Err(LabelError::Sink(SinkError::Http { status: 403, .. }))));
    }
}
