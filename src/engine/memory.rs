//! In-process engine that records what it is asked to do
//!
//! Nothing is decoded or rendered. Pipelines keep every pushed buffer, follow
//! the same state machine as real ones and report the last seek target as
//! their position, which is enough to drive the controllers end to end.

use super::{MediaEngine, MediaPipeline, PipelineSpec, SeekFlags, has_scheme};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineState;
use bytes::Bytes;
use log::debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const MEMORY_ENGINE_VERSION: (u32, u32) = (1, 24);

pub struct MemoryEngine {
    playlist_duration: Duration,
    pipelines: Mutex<Vec<MemoryPipeline>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            playlist_duration: Duration::ZERO,
            pipelines: Mutex::new(Vec::new()),
        }
    }

    /// Duration reported by playlist pipelines built from now on
    pub fn with_playlist_duration(mut self, duration: Duration) -> Self {
        self.playlist_duration = duration;
        self
    }

    /// Every pipeline built so far, oldest first
    pub fn pipelines(&self) -> Vec<MemoryPipeline> {
        self.pipelines
            .lock()
            .map(|pipelines| pipelines.clone())
            .unwrap_or_default()
    }

    /// Most recent push pipeline whose input stage is called `name`
    pub fn push_pipeline(&self, name: &str) -> Option<MemoryPipeline> {
        self.pipelines()
            .into_iter()
            .rev()
            .find(|p| matches!(p.spec(), PipelineSpec::Push { name: n, .. } if n == name))
    }

    /// Playlist pipelines, oldest first
    pub fn playlists(&self) -> Vec<MemoryPipeline> {
        self.pipelines()
            .into_iter()
            .filter(|p| p.uri().is_some())
            .collect()
    }
}

impl MediaEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn init(&self, config: &EngineConfig) -> Result<()> {
        if config.min_version > MEMORY_ENGINE_VERSION {
            return Err(Error::UnsupportedVersion {
                found: format!("{}.{}", MEMORY_ENGINE_VERSION.0, MEMORY_ENGINE_VERSION.1),
                required: format!("{}.{}", config.min_version.0, config.min_version.1),
            });
        }
        Ok(())
    }

    fn build(&self, spec: &PipelineSpec) -> Result<Box<dyn MediaPipeline>> {
        let duration = match spec {
            PipelineSpec::Push { caps, graph, .. } => {
                if caps.is_empty() || graph.is_empty() {
                    return Err(Error::Engine(format!(
                        "incomplete pipeline description: {}",
                        spec.launch_line()
                    )));
                }
                None
            }
            PipelineSpec::Playlist { uri, .. } => {
                if !has_scheme(uri) {
                    return Err(Error::Engine(format!("invalid playlist URI '{}'", uri)));
                }
                Some(self.playlist_duration)
            }
        };

        let pipeline = MemoryPipeline {
            inner: Arc::new(Inner {
                spec: spec.clone(),
                duration,
                state: Mutex::new(PipelineState::Unstarted),
                buffers: Mutex::new(Vec::new()),
                position: Mutex::new(Duration::ZERO),
                seeks: Mutex::new(Vec::new()),
            }),
        };
        self.pipelines.lock()?.push(pipeline.clone());
        debug!("MemoryEngine: built {}", spec.launch_line());

        Ok(Box::new(pipeline))
    }
}

struct Inner {
    spec: PipelineSpec,
    duration: Option<Duration>,
    state: Mutex<PipelineState>,
    buffers: Mutex<Vec<Bytes>>,
    position: Mutex<Duration>,
    seeks: Mutex<Vec<(Duration, SeekFlags)>>,
}

/// Shared handle on a recorded pipeline
#[derive(Clone)]
pub struct MemoryPipeline {
    inner: Arc<Inner>,
}

impl MemoryPipeline {
    pub fn spec(&self) -> &PipelineSpec {
        &self.inner.spec
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.inner.spec {
            PipelineSpec::Playlist { uri, .. } => Some(uri.as_str()),
            PipelineSpec::Push { .. } => None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.inner
            .state
            .lock()
            .map(|state| *state)
            .unwrap_or(PipelineState::Stopped)
    }

    /// Buffers pushed so far, in push order
    pub fn buffers(&self) -> Vec<Bytes> {
        self.inner
            .buffers
            .lock()
            .map(|buffers| buffers.clone())
            .unwrap_or_default()
    }

    pub fn seeks(&self) -> Vec<(Duration, SeekFlags)> {
        self.inner
            .seeks
            .lock()
            .map(|seeks| seeks.clone())
            .unwrap_or_default()
    }

    fn transition(&self, target: PipelineState) -> Result<()> {
        let mut state = self.inner.state.lock()?;
        if !state.can_transition_to(&target) {
            return Err(Error::Engine(format!(
                "{}: invalid state change {} -> {}",
                self.inner.spec.name(),
                state,
                target
            )));
        }
        *state = target;
        Ok(())
    }
}

impl MediaPipeline for MemoryPipeline {
    fn start(&self) -> Result<()> {
        self.transition(PipelineState::playing())
    }

    fn pause(&self) -> Result<()> {
        self.transition(PipelineState::paused())
    }

    fn stop(&self) -> Result<()> {
        self.transition(PipelineState::Stopped)?;
        *self.inner.position.lock()? = Duration::ZERO;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    fn push(&self, buffer: Bytes) -> Result<()> {
        if self.uri().is_some() {
            return Err(Error::NoInputStage(self.inner.spec.name().to_string()));
        }
        if !self.state().is_active() {
            return Err(Error::Engine(format!(
                "{}: flushing, pipeline is {}",
                self.inner.spec.name(),
                self.state()
            )));
        }
        self.inner.buffers.lock()?.push(buffer);
        Ok(())
    }

    fn seek(&self, position: Duration, flags: SeekFlags) -> Result<()> {
        if !self.state().is_active() {
            return Err(Error::Engine(format!(
                "{}: cannot seek while {}",
                self.inner.spec.name(),
                self.state()
            )));
        }
        let target = match self.inner.duration {
            Some(duration) if !duration.is_zero() => position.min(duration),
            _ => position,
        };
        *self.inner.position.lock()? = target;
        self.inner.seeks.lock()?.push((position, flags));
        Ok(())
    }

    fn query_duration(&self) -> Option<Duration> {
        if self.state().is_active() {
            self.inner.duration
        } else {
            None
        }
    }

    fn query_position(&self) -> Option<Duration> {
        if self.state().is_active() {
            self.inner.position.lock().ok().map(|position| *position)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_requires_running_pipeline() {
        let engine = MemoryEngine::new();
        let pipeline = engine
            .build(&PipelineSpec::push("src", "video/x-h264", "fakesink"))
            .unwrap();

        assert!(pipeline.push(Bytes::from_static(b"early")).is_err());

        pipeline.start().unwrap();
        pipeline.push(Bytes::from_static(b"frame")).unwrap();

        let recorded = engine.push_pipeline("src").unwrap();
        assert_eq!(recorded.buffers(), vec![Bytes::from_static(b"frame")]);
    }

    #[test]
    fn test_playlist_pipeline_has_no_input_stage() {
        let engine = MemoryEngine::new();
        let pipeline = engine
            .build(&PipelineSpec::playlist("http://x/a.m3u8", "playbin3"))
            .unwrap();
        pipeline.start().unwrap();

        let err = pipeline.push(Bytes::from_static(b"x")).unwrap_err();
        assert!(matches!(err, Error::NoInputStage(_)));
    }

    #[test]
    fn test_rejects_malformed_uri() {
        let engine = MemoryEngine::new();
        let result = engine.build(&PipelineSpec::playlist("not a uri", "playbin3"));
        assert!(matches!(result, Err(Error::Engine(_))));
        assert!(engine.pipelines().is_empty());
    }

    #[test]
    fn test_seek_moves_position_within_duration() {
        let engine = MemoryEngine::new().with_playlist_duration(Duration::from_secs(60));
        let pipeline = engine
            .build(&PipelineSpec::playlist("http://x/a.m3u8", "playbin3"))
            .unwrap();

        assert_eq!(pipeline.query_duration(), None);
        pipeline.start().unwrap();
        assert_eq!(pipeline.query_position(), Some(Duration::ZERO));

        pipeline
            .seek(Duration::from_secs(90), SeekFlags::FLUSH_KEY_UNIT)
            .unwrap();
        assert_eq!(pipeline.query_position(), Some(Duration::from_secs(60)));

        pipeline.stop().unwrap();
        assert_eq!(pipeline.query_position(), None);
    }

    #[test]
    fn test_stopped_pipeline_restarts() {
        let engine = MemoryEngine::new();
        let pipeline = engine
            .build(&PipelineSpec::push("src", "audio/mpeg", "fakesink"))
            .unwrap();

        pipeline.start().unwrap();
        pipeline.stop().unwrap();
        assert!(pipeline.pause().is_err());
        pipeline.start().unwrap();
        assert!(pipeline.is_playing());
    }
}
