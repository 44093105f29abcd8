//! Playback orchestration for an AirPlay-style media receiver.
//!
//! The protocol layer reports stream announcements, encoded buffers and
//! transport commands through [`AirPlayConsumer`]; [`Player`] turns them into
//! pipeline operations on a [`MediaEngine`].
//!
//! ```no_run
//! use airplay_player::{AirPlayConsumer, Config, MediaRuntime, Player};
//! use airplay_player::engine::MemoryEngine;
//! use std::sync::Arc;
//!
//! # fn main() -> airplay_player::Result<()> {
//! let config = Config::default();
//! let runtime = MediaRuntime::init(Arc::new(MemoryEngine::new()), &config.engine)?;
//! let player = Player::new(runtime.engine(), &config)?;
//! player.on_media_playlist("http://example.com/stream.m3u8")?;
//! println!("{}", player.playback_info());
//! runtime.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod player;

pub use config::{Config, EngineConfig};
pub use engine::{MediaEngine, MediaPipeline, MediaRuntime, PipelineSpec};
pub use error::{Error, Result};
pub use pipeline::{AudioFormat, CompressionVariant, MediaKind, PlaybackInfo, VideoFormat};
pub use player::{AirPlayConsumer, Player};
