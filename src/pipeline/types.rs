//! Core types for the pipeline system

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of pushed media stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Encoded video access units
    Video,
    /// Encoded audio frames
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "Video"),
            MediaKind::Audio => write!(f, "Audio"),
        }
    }
}

/// Audio codec family negotiated for the session.
///
/// The set is closed: every place that routes audio matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionVariant {
    /// Apple Lossless
    Alac,
    /// AAC Enhanced Low Delay
    AacEld,
}

impl CompressionVariant {
    pub const ALL: [CompressionVariant; 2] = [CompressionVariant::Alac, CompressionVariant::AacEld];

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            CompressionVariant::Alac => 1,
            CompressionVariant::AacEld => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(CompressionVariant::Alac),
            2 => Some(CompressionVariant::AacEld),
            _ => None,
        }
    }
}

impl std::fmt::Display for CompressionVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionVariant::Alac => write!(f, "ALAC"),
            CompressionVariant::AacEld => write!(f, "AAC-ELD"),
        }
    }
}

/// Video stream announcement.
///
/// The codec profile is fixed (H.264 byte-stream), so the announcement only
/// triggers the pipeline start; the connection id is kept for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VideoFormat {
    pub stream_connection_id: u64,
}

impl VideoFormat {
    pub fn new(stream_connection_id: u64) -> Self {
        Self { stream_connection_id }
    }
}

/// Audio stream announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub compression: CompressionVariant,
}

impl AudioFormat {
    pub fn new(compression: CompressionVariant) -> Self {
        Self { compression }
    }
}

/// Duration and position of the media playlist, in seconds.
///
/// `Default` is the `{0, 0}` value reported when no playlist exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackInfo {
    pub duration_seconds: f64,
    pub position_seconds: f64,
}

impl PlaybackInfo {
    pub fn new(duration: Option<Duration>, position: Option<Duration>) -> Self {
        Self {
            duration_seconds: duration.map_or(0.0, |d| d.as_secs_f64()),
            position_seconds: position.map_or(0.0, |p| p.as_secs_f64()),
        }
    }
}

impl std::fmt::Display for PlaybackInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.1}s / {:.1}s",
            self.position_seconds, self.duration_seconds
        )
    }
}
