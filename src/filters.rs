//! Extraction of the fields the collector needs from player API payloads.

use std::collections::BTreeMap;
use anyhow::{Context, Result};
use serde_json::Value;
use crate::core::{PlaybackInfo, PlaybackSnapshot};
use crate::hal::SourceError;
use crate::labeling::PlaylistRef;

/// Playlists the labeler may write to are recognised by this name prefix
pub const PLAYLIST_PREFIX: &str = "EEG-";

fn str_at<'a>(value: &'a Value, pointer: &str) -> Result<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .with_context(|| format!("missing string field {}", pointer))
}

fn u64_at(value: &Value, pointer: &str) -> Result<u64> {
    value
        .pointer(pointer)
        .and_then(Value::as_u64)
        .with_context(|| format!("missing integer field {}", pointer))
}

/// Build a `PlaybackInfo` from a currently-playing payload.
///
/// Only the first artist is kept; durations are truncated to whole seconds.
pub fn playback_info(payload: &Value) -> Result<PlaybackInfo> {
    Ok(PlaybackInfo {
        artists: str_at(payload, "/item/artists/0/name")?.to_string(),
        song: str_at(payload, "/item/name")?.to_string(),
        uri: str_at(payload, "/item/uri")?.to_string(),
        popularity: u64_at(payload, "/item/popularity")? as u32,
        album: str_at(payload, "/item/album/name")?.to_string(),
        released: str_at(payload, "/item/album/release_date")?.to_string(),
        duration: u64_at(payload, "/item/duration_ms")? / 1000,
        progress: u64_at(payload, "/progress_ms")? / 1000,
    })
}

/// Interpret a player response: 204 means nothing is playing
pub fn player_snapshot(status: u16, payload: &Value) -> Result<PlaybackSnapshot, SourceError> {
    match status {
        204 => Ok(PlaybackSnapshot::Empty),
        200 => {
            // a 200 without an item (e.g. an ad break) is nothing playing
            if payload.get("item").map_or(true, Value::is_null) {
                return Ok(PlaybackSnapshot::Empty);
            }
            playback_info(payload)
                .map(PlaybackSnapshot::Playing)
                .map_err(|e| SourceError::Payload(format!("{:#}", e)))
        }
        401 => Err(SourceError::Unauthorized),
        code => Err(SourceError::Http(code)),
    }
}

/// Playlists from a user-playlists payload whose names carry the prefix
pub fn eeg_playlists(payload: &Value) -> Result<BTreeMap<String, PlaylistRef>> {
    let items = payload
        .get("items")
        .and_then(Value::as_array)
        .context("missing playlist items")?;

    let mut playlists = BTreeMap::new();
    for item in items {
        let name = str_at(item, "/name")?;
        if !name.starts_with(PLAYLIST_PREFIX) {
            continue;
        }

        playlists.insert(
            name.to_string(),
            PlaylistRef {
                id: str_at(item, "/id")?.to_string(),
                ntracks: u64_at(item, "/tracks/total")?,
            },
        );
    }
    Ok(playlists)
}
