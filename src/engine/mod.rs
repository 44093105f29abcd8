//! Media engine abstraction
//!
//! The controllers never decode or render anything themselves. They describe
//! the graph they need with a [`PipelineSpec`], ask a [`MediaEngine`] to build
//! it, and drive the returned [`MediaPipeline`] handle.
//!
//! Backends:
//! - `gst`: GStreamer (cargo feature `gstreamer`)
//! - `memory`: in-process recording engine, no rendering

#[cfg(feature = "gstreamer")]
pub mod gst;
pub mod memory;
pub mod runtime;
pub mod sink;

pub use memory::{MemoryEngine, MemoryPipeline};
pub use runtime::MediaRuntime;
pub use sink::{VideoOutput, VideoSinkBuilder};

use crate::config::EngineConfig;
use crate::error::Result;
use bytes::Bytes;
use std::time::Duration;

/// Description of a pipeline to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineSpec {
    /// Push pipeline: an input stage named `name` accepting `caps`, linked
    /// into the launch fragment `graph`.
    Push {
        name: String,
        caps: String,
        graph: String,
    },
    /// Pull pipeline rendering a remote playlist through `element`.
    Playlist { uri: String, element: String },
}

impl PipelineSpec {
    pub fn push(name: impl Into<String>, caps: impl Into<String>, graph: impl Into<String>) -> Self {
        PipelineSpec::Push {
            name: name.into(),
            caps: caps.into(),
            graph: graph.into(),
        }
    }

    pub fn playlist(uri: impl Into<String>, element: impl Into<String>) -> Self {
        PipelineSpec::Playlist {
            uri: uri.into(),
            element: element.into(),
        }
    }

    /// Name used in logs and errors
    pub fn name(&self) -> &str {
        match self {
            PipelineSpec::Push { name, .. } => name,
            PipelineSpec::Playlist { element, .. } => element,
        }
    }

    /// Launch line for engines that parse textual descriptions
    pub fn launch_line(&self) -> String {
        match self {
            PipelineSpec::Push { name, graph, .. } => format!("appsrc name={} ! {}", name, graph),
            PipelineSpec::Playlist { uri, element } => format!("{} uri={}", element, uri),
        }
    }
}

/// Seek behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekFlags {
    /// Discard data already queued in the pipeline
    pub flush: bool,
    /// Resume from the nearest key unit at or before the target
    pub key_unit: bool,
}

impl SeekFlags {
    pub const FLUSH_KEY_UNIT: SeekFlags = SeekFlags {
        flush: true,
        key_unit: true,
    };
}

/// Running instance of an engine processing graph.
///
/// Every call is a non-blocking request; the engine does its own threading.
pub trait MediaPipeline: Send + Sync {
    fn start(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn is_playing(&self) -> bool;

    /// Hand one encoded buffer to the input stage
    fn push(&self, buffer: Bytes) -> Result<()>;

    /// Absolute seek
    fn seek(&self, position: Duration, flags: SeekFlags) -> Result<()>;

    fn query_duration(&self) -> Option<Duration>;

    fn query_position(&self) -> Option<Duration>;
}

/// Factory for pipelines plus the engine's process-wide setup.
pub trait MediaEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Process-wide initialization. Called once, through [`MediaRuntime`].
    fn init(&self, _config: &EngineConfig) -> Result<()> {
        Ok(())
    }

    /// Process-wide teardown. Called once, through [`MediaRuntime`].
    fn shutdown(&self) {}

    fn build(&self, spec: &PipelineSpec) -> Result<Box<dyn MediaPipeline>>;
}

/// Check that `uri` starts with an RFC 3986 scheme followed by `:`
pub(crate) fn has_scheme(uri: &str) -> bool {
    match uri.split_once(':') {
        Some((scheme, rest)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                && !rest.is_empty()
        }
        None => false,
    }
}
