//! Pipeline building blocks shared by the controllers
//!
//! - `state`: lifecycle of an engine pipeline handle
//! - `types`: stream announcements, compression variants, playback info
//! - `health`: counters for the pushed video and audio streams

pub mod health;
pub mod state;
pub mod types;

pub use health::{HealthSummary, PipelineHealth};
pub use state::PipelineState;
pub use types::{AudioFormat, CompressionVariant, MediaKind, PlaybackInfo, VideoFormat};
