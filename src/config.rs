use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use crate::engine::{CollectorConfig, MonitorConfig, SessionConfig};
use crate::hal::StreamInfo;
use crate::labeling::PlaylistRef;

pub const DEFAULT_CONFIG_PATH: &str = "configs/app.json";

/// Application settings persisted as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Subject id written into every record
    pub userid: String,

    /// Directory epoch records are written to
    pub session_data_dir: PathBuf,

    /// Label -> playlist name
    pub labels_to_playlists: BTreeMap<String, String>,

    /// Playlist name -> reference, as last fetched from the player
    pub playlists: BTreeMap<String, PlaylistRef>,

    /// Layout of the simulated stream
    pub stream: StreamInfo,

    pub collector: CollectorConfig,
    pub monitor: MonitorConfig,
    pub session: SessionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let labels_to_playlists = [("like", "EEG-Liked"), ("dislike", "EEG-Disliked"), ("meh", "EEG-Meh")]
            .into_iter()
            .map(|(label, playlist)| (label.to_string(), playlist.to_string()))
            .collect();

        Self {
            userid: "0".to_string(),
            session_data_dir: PathBuf::from("data"),
            labels_to_playlists,
            playlists: BTreeMap::new(),
            stream: StreamInfo::default(),
            collector: CollectorConfig::default(),
            monitor: MonitorConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Labels a session can be tagged with
    pub fn labels(&self) -> Vec<String> {
        self.labels_to_playlists.keys().cloned().collect()
    }
}

/// Loads and saves the `AppConfig` file
pub struct ConfigManager {
    config_path: PathBuf,
    state: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    /// The in-memory state starts at the defaults; call `load()` to read the file
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            state: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub async fn ensure_config_file(&self) -> Result<()> {
        if !self.config_path.exists() {
            if let Some(parent) = self.config_path.parent() {
                fs::create_dir_all(parent).await
                    .context("Failed to create config directory")?;
            }

            let json = serde_json::to_string_pretty(&AppConfig::default())?;
            fs::write(&self.config_path, json).await
                .context("Failed to write default config")?;
            log::info!("Wrote default config to {:?}", self.config_path);
        }

        Ok(())
    }

    pub async fn load(&self) -> Result<AppConfig> {
        self.ensure_config_file().await?;

        let content = fs::read_to_string(&self.config_path).await
            .context("Failed to read config file")?;

        let config: AppConfig = serde_json::from_str(&content)
            .context("Failed to parse config JSON")?;

        *self.state.write().await = config.clone();
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        let config = self.state.read().await;
        let json = serde_json::to_string_pretty(&*config)?;

        let temp_path = self.config_path.with_extension("tmp");
        fs::write(&temp_path, json).await
            .context("Failed to write temporary config file")?;

        fs::rename(&temp_path, &self.config_path).await
            .context("Failed to atomically update config file")?;

        Ok(())
    }

    pub async fn get(&self) -> AppConfig {
        self.state.read().await.clone()
    }

    /// Apply `change` and save the result
    pub async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.state.write().await;
        change(&mut config);
        drop(config);

        self.save().await
    }

    /// Replace the known playlists, e.g. after fetching them from the player
    pub async fn set_playlists(&self, playlists: BTreeMap<String, PlaylistRef>) -> Result<()> {
        self.update(|config| config.playlists = playlists).await
    }
}
