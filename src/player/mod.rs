//! Receiver-side playback orchestration
//!
//! [`Player`] is the single entry point the protocol layer talks to. It keeps
//! no state of its own and hands every event to the controller that owns the
//! stream:
//!
//! ```text
//! protocol events → Player → Video / Audio / Playlist controller → MediaEngine
//! ```

pub mod audio;
pub mod playlist;
pub mod video;

pub use audio::{AudioController, StreamFormat};
pub use playlist::PlaylistController;
pub use video::VideoController;

use crate::config::Config;
use crate::engine::{MediaEngine, VideoSinkBuilder};
use crate::error::Result;
use crate::pipeline::{
    AudioFormat, CompressionVariant, MediaKind, PipelineHealth, PipelineState, PlaybackInfo,
    VideoFormat,
};
use bytes::Bytes;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

/// Events delivered by the AirPlay protocol layer.
///
/// Buffer events may arrive on an I/O thread while transport commands arrive
/// on a control thread, hence `&self` everywhere.
pub trait AirPlayConsumer: Send + Sync {
    fn on_video_format(&self, format: &VideoFormat) -> Result<()>;

    fn on_video(&self, buffer: Bytes) -> Result<()>;

    fn on_video_src_disconnect(&self) -> Result<()>;

    fn on_audio_format(&self, format: &AudioFormat) -> Result<()>;

    fn on_audio(&self, buffer: Bytes) -> Result<()>;

    fn on_audio_src_disconnect(&self) -> Result<()>;

    fn on_media_playlist(&self, uri: &str) -> Result<()>;

    fn on_media_playlist_remove(&self) -> Result<()>;

    fn on_media_playlist_pause(&self) -> Result<()>;

    fn on_media_playlist_resume(&self) -> Result<()>;

    fn on_media_scrub(&self, position_seconds: f64) -> Result<()>;

    fn playback_info(&self) -> PlaybackInfo {
        PlaybackInfo::default()
    }
}

pub struct Player {
    video: VideoController,
    audio: AudioController,
    playlist: PlaylistController,
}

impl Player {
    /// Build a player with the video output selected in `config`.
    pub fn new(engine: Arc<dyn MediaEngine>, config: &Config) -> Result<Self> {
        let sink = config.video_output.builder();
        Self::with_video_sink(engine, config, sink.as_ref())
    }

    /// Build a player rendering video through `sink`.
    pub fn with_video_sink(
        engine: Arc<dyn MediaEngine>,
        config: &Config,
        sink: &dyn VideoSinkBuilder,
    ) -> Result<Self> {
        Ok(Self {
            video: VideoController::new(engine.as_ref(), sink)?,
            audio: AudioController::new(Arc::clone(&engine), config.audio_sink.as_str()),
            playlist: PlaylistController::new(engine, config.playlist_element.as_str()),
        })
    }

    /// Health counters of a pushed stream
    pub fn health(&self, kind: MediaKind) -> Arc<PipelineHealth> {
        match kind {
            MediaKind::Video => self.video.health(),
            MediaKind::Audio => self.audio.health(),
        }
    }

    /// Whether a started stream has gone `threshold` without a buffer.
    ///
    /// Video gets the same grace period after each (re)start.
    pub fn is_stalled(&self, kind: MediaKind, threshold: Duration) -> bool {
        let started = match kind {
            MediaKind::Video => self
                .video
                .state()
                .playing_duration()
                .is_some_and(|playing| playing > threshold),
            MediaKind::Audio => self.audio.is_running(),
        };
        started && self.health(kind).is_stalled(threshold)
    }

    pub fn video_state(&self) -> PipelineState {
        self.video.state()
    }

    pub fn audio_compression(&self) -> Option<CompressionVariant> {
        self.audio.compression()
    }

    pub fn playlist_uri(&self) -> Option<String> {
        self.playlist.uri()
    }
}

impl AirPlayConsumer for Player {
    fn on_video_format(&self, format: &VideoFormat) -> Result<()> {
        self.video.on_format(format)
    }

    fn on_video(&self, buffer: Bytes) -> Result<()> {
        self.video.on_buffer(buffer)
    }

    fn on_video_src_disconnect(&self) -> Result<()> {
        self.video.on_disconnect()
    }

    fn on_audio_format(&self, format: &AudioFormat) -> Result<()> {
        self.audio.on_format(format)
    }

    fn on_audio(&self, buffer: Bytes) -> Result<()> {
        self.audio.on_buffer(buffer)
    }

    fn on_audio_src_disconnect(&self) -> Result<()> {
        self.audio.on_disconnect()
    }

    fn on_media_playlist(&self, uri: &str) -> Result<()> {
        self.playlist.on_playlist(uri)
    }

    fn on_media_playlist_remove(&self) -> Result<()> {
        self.playlist.on_remove()
    }

    fn on_media_playlist_pause(&self) -> Result<()> {
        self.playlist.on_pause()
    }

    fn on_media_playlist_resume(&self) -> Result<()> {
        self.playlist.on_resume()
    }

    fn on_media_scrub(&self, position_seconds: f64) -> Result<()> {
        self.playlist.on_scrub(position_seconds)
    }

    fn playback_info(&self) -> PlaybackInfo {
        match self.playlist.playback_info() {
            Ok(Some(info)) => info,
            Ok(None) => PlaybackInfo::default(),
            Err(e) => {
                warn!("Player: playback info unavailable: {}", e);
                PlaybackInfo::default()
            }
        }
    }
}
