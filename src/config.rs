use crate::assets::{
    DEFAULT_AUDIO_SINK, DEFAULT_DEBUG_LEVEL, DEFAULT_PLAYLIST_ELEMENT, MIN_ENGINE_VERSION,
};
use crate::engine::VideoOutput;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Process-wide media engine settings, applied once by `MediaRuntime::init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine debug threshold, in the engine's own syntax (`"3"`, `"*:2,appsrc:5"`)
    pub debug_level: String,
    /// Oldest engine release accepted, as `(major, minor)`
    pub min_version: (u32, u32),
    /// Extra directories scanned for engine plugins
    pub plugin_paths: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug_level: DEFAULT_DEBUG_LEVEL.to_string(),
            min_version: MIN_ENGINE_VERSION,
            plugin_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub video_output: VideoOutput,
    /// Sink element terminating both audio pipelines
    pub audio_sink: String,
    /// Element that renders media playlists
    pub playlist_element: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            video_output: VideoOutput::default(),
            audio_sink: DEFAULT_AUDIO_SINK.to_string(),
            playlist_element: DEFAULT_PLAYLIST_ELEMENT.to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON configuration file; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Returns a version as specified in Cargo.toml
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn app_name() -> &'static str {
    env!("CARGO_PKG_NAME")
}
