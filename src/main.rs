use std::sync::Arc;
use anyhow::Result;
use eegsync::config::{ConfigManager, DEFAULT_CONFIG_PATH};
use eegsync::core::{PlaybackInfo, PlaybackSnapshot};
use eegsync::hal::mock::{ScriptedPlaybackSource, SimulatedEegStream};
use eegsync::labeling::{PlaylistSink, RecordingPlaylistSink};
use eegsync::storage::JsonRecordStore;
use eegsync::CollectionContext;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = ConfigManager::new(config_path).load().await?;

    println!("EEG Sync - simulated collection session");
    println!("=======================================\n");

    let store = Arc::new(JsonRecordStore::new(&config.session_data_dir)?);
    let poll = Duration::from_millis(config.monitor.poll_interval_ms);
    let mut context = CollectionContext::new(config.clone(), store.clone());

    context.connect_stream(Box::new(SimulatedEegStream::with_info(config.stream.clone())))?;
    context.start_collector()?;

    // Nothing, then two songs, then nothing again
    let first = PlaybackInfo::new("spotify:track:first", "First Song");
    let second = PlaybackInfo::new("spotify:track:second", "Second Song");
    let mut script = vec![PlaybackSnapshot::Empty];
    script.extend(std::iter::repeat(PlaybackSnapshot::from(first)).take(3));
    script.extend(std::iter::repeat(PlaybackSnapshot::from(second)).take(3));
    script.push(PlaybackSnapshot::Empty);

    let sink = Arc::new(RecordingPlaylistSink::new());
    context.start_session(Box::new(ScriptedPlaybackSource::new(script)), Some(sink.clone() as Arc<dyn PlaylistSink>))?;
    println!("Status: {:?}", context.status());

    sleep(poll * 5 / 2).await;
    context.label("like").await?;

    sleep(poll * 3).await;
    context.label("meh").await?;

    sleep(poll * 3).await;
    context.stop_session().await?;
    context.stop_collector().await?;

    println!("\nRecords in {:?}:", store.dir());
    for id in store.list_ids()? {
        let frame = store.load(&id)?;
        println!(
            "  {} - '{}' labeled {:?}, {} samples",
            id,
            frame.playback.song,
            frame.label,
            frame.sample_count()
        );
    }

    println!("\nRecords per label:");
    for (label, count) in store.label_counts()? {
        println!("  {}: {}", label.as_deref().unwrap_or("(unlabeled)"), count);
    }

    println!("\nPlaylist additions: {:?}", sink.added());
    println!("\n{}", context.status_report());

    context.disconnect_stream().await?;
    Ok(())
}
