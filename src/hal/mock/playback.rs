use crate::core::PlaybackSnapshot;
use crate::hal::{PlaybackSource, SourceError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type ScriptStep = Result<PlaybackSnapshot, SourceError>;

/// Playback source that replays a scripted sequence of poll results.
///
/// Once the script runs out the last successful snapshot is reported again,
/// so a finished script looks like a player that keeps playing the same item.
pub struct ScriptedPlaybackSource {
    script: Arc<Mutex<VecDeque<ScriptStep>>>,
    last: PlaybackSnapshot,
    polls: u64,
}

/// Appends steps to a running `ScriptedPlaybackSource`
#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<VecDeque<ScriptStep>>>,
}

impl ScriptedPlaybackSource {
    pub fn new(snapshots: impl IntoIterator<Item = PlaybackSnapshot>) -> Self {
        Self {
            script: Arc::new(Mutex::new(snapshots.into_iter().map(Ok).collect())),
            last: PlaybackSnapshot::Empty,
            polls: 0,
        }
    }

    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle {
            script: Arc::clone(&self.script),
        }
    }

    /// Number of polls served so far
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl ScriptHandle {
    pub fn push(&self, snapshot: PlaybackSnapshot) {
        self.script.lock().push_back(Ok(snapshot));
    }

    pub fn push_failure(&self, error: SourceError) {
        self.script.lock().push_back(Err(error));
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl PlaybackSource for ScriptedPlaybackSource {
    async fn fetch_current(&mut self) -> Result<PlaybackSnapshot, SourceError> {
        self.polls += 1;

        let step = self.script.lock().pop_front();
        match step {
            Some(Ok(snapshot)) => {
                self.last = snapshot.clone();
                Ok(snapshot)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.clone()),
        }
    }
}
