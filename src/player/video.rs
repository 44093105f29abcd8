//! Video pipeline controller
//!
//! Owns the H.264 pipeline for the whole session: built once, started on each
//! format announcement, stopped on disconnect.

use crate::assets::{VIDEO_CAPS, VIDEO_SRC_NAME};
use crate::engine::{MediaEngine, MediaPipeline, PipelineSpec, VideoSinkBuilder};
use crate::error::{Error, Result};
use crate::pipeline::{MediaKind, PipelineHealth, PipelineState, VideoFormat};
use bytes::Bytes;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

struct VideoSlot {
    pipeline: Box<dyn MediaPipeline>,
    state: PipelineState,
}

pub struct VideoController {
    slot: Mutex<VideoSlot>,
    health: Arc<PipelineHealth>,
}

impl VideoController {
    /// Build the video pipeline: fixed H.264 input stage, `sink` downstream.
    pub fn new(engine: &dyn MediaEngine, sink: &dyn VideoSinkBuilder) -> Result<Self> {
        let spec = PipelineSpec::push(VIDEO_SRC_NAME, VIDEO_CAPS, sink.render_graph());
        let pipeline = engine.build(&spec)?;
        info!("VideoController: pipeline built ({} output)", sink.name());

        Ok(Self {
            slot: Mutex::new(VideoSlot {
                pipeline,
                state: PipelineState::Unstarted,
            }),
            health: Arc::new(PipelineHealth::new()),
        })
    }

    pub fn on_format(&self, format: &VideoFormat) -> Result<()> {
        let mut slot = self.slot.lock()?;
        if slot.state.is_playing() {
            debug!(
                "VideoController: already playing, ignoring format for connection {}",
                format.stream_connection_id
            );
            return Ok(());
        }

        slot.pipeline.start()?;
        slot.state = PipelineState::playing();
        info!(
            "VideoController: started for connection {}",
            format.stream_connection_id
        );
        Ok(())
    }

    /// Push one access unit. Buffers are pushed under the slot lock, so
    /// concurrent callers reach the engine in lock order.
    pub fn on_buffer(&self, buffer: Bytes) -> Result<()> {
        let slot = self.slot.lock()?;
        if !slot.state.is_playing() {
            self.health.record_rejected();
            warn!(
                "VideoController: rejecting {} byte buffer, pipeline is {}",
                buffer.len(),
                slot.state
            );
            return Err(Error::NotStarted(MediaKind::Video));
        }

        let size = buffer.len();
        if let Err(e) = slot.pipeline.push(buffer) {
            self.health.record_push_failure();
            return Err(e);
        }
        self.health.record_buffer(size);
        Ok(())
    }

    pub fn on_disconnect(&self) -> Result<()> {
        let mut slot = self.slot.lock()?;
        if !slot.state.is_active() {
            debug!("VideoController: disconnect while {}, nothing to stop", slot.state);
            return Ok(());
        }

        slot.pipeline.stop()?;
        slot.state = PipelineState::Stopped;
        info!("VideoController: stopped ({})", self.health.summary());
        Ok(())
    }

    pub fn state(&self) -> PipelineState {
        self.slot
            .lock()
            .map(|slot| slot.state)
            .unwrap_or(PipelineState::Stopped)
    }

    pub fn health(&self) -> Arc<PipelineHealth> {
        Arc::clone(&self.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::engine::sink::CustomVideoSink;

    fn controller() -> (Arc<MemoryEngine>, VideoController) {
        let engine = Arc::new(MemoryEngine::new());
        let video = VideoController::new(engine.as_ref(), &CustomVideoSink::new("fakesink")).unwrap();
        (engine, video)
    }

    #[test]
    fn test_builds_fixed_input_stage() {
        let (engine, _video) = controller();
        let pipeline = engine.push_pipeline(VIDEO_SRC_NAME).unwrap();
        assert_eq!(
            pipeline.spec(),
            &PipelineSpec::push(VIDEO_SRC_NAME, VIDEO_CAPS, "fakesink")
        );
        assert_eq!(pipeline.state(), PipelineState::Unstarted);
    }

    #[test]
    fn test_buffer_before_format_is_rejected() {
        let (engine, video) = controller();

        let err = video.on_buffer(Bytes::from_static(b"au")).unwrap_err();
        assert!(matches!(err, Error::NotStarted(MediaKind::Video)));
        assert_eq!(video.health().buffers_rejected(), 1);
        assert!(engine.push_pipeline(VIDEO_SRC_NAME).unwrap().buffers().is_empty());
    }

    #[test]
    fn test_format_is_idempotent() {
        let (_engine, video) = controller();
        video.on_format(&VideoFormat::new(7)).unwrap();
        video.on_format(&VideoFormat::new(7)).unwrap();
        assert!(video.state().is_playing());
    }

    #[test]
    fn test_restart_after_disconnect() {
        let (engine, video) = controller();
        video.on_format(&VideoFormat::default()).unwrap();
        video.on_buffer(Bytes::from_static(b"one")).unwrap();
        video.on_disconnect().unwrap();

        assert!(video.on_buffer(Bytes::from_static(b"lost")).is_err());

        video.on_format(&VideoFormat::default()).unwrap();
        video.on_buffer(Bytes::from_static(b"two")).unwrap();

        let pushed = engine.push_pipeline(VIDEO_SRC_NAME).unwrap().buffers();
        assert_eq!(pushed, vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]);
        assert_eq!(engine.pipelines().len(), 1);
        assert_eq!(video.health().buffers_pushed(), 2);
    }

    #[test]
    fn test_disconnect_racing_pushes() {
        let (engine, video) = controller();
        let video = Arc::new(video);
        video.on_format(&VideoFormat::default()).unwrap();

        let pusher = {
            let video = Arc::clone(&video);
            std::thread::spawn(move || {
                (0..2000u16)
                    .map(|seq| video.on_buffer(Bytes::from(seq.to_be_bytes().to_vec())))
                    .collect::<Vec<_>>()
            })
        };
        while video.health().buffers_pushed() < 10 {
            std::thread::yield_now();
        }
        video.on_disconnect().unwrap();
        let results = pusher.join().unwrap();

        // accepted pushes form a prefix, everything after the stop is rejected
        let accepted = results.iter().take_while(|r| r.is_ok()).count();
        assert!(accepted >= 10);
        assert!(
            results[accepted..]
                .iter()
                .all(|r| matches!(r, Err(Error::NotStarted(MediaKind::Video))))
        );

        let pushed = engine.push_pipeline(VIDEO_SRC_NAME).unwrap().buffers();
        assert_eq!(pushed.len(), accepted);
        assert_eq!(video.state(), PipelineState::Stopped);
        assert_eq!(
            video.health().buffers_rejected(),
            (results.len() - accepted) as u64
        );
    }

    #[test]
    fn test_disconnect_without_start_is_noop() {
        let (engine, video) = controller();
        video.on_disconnect().unwrap();
        assert_eq!(video.state(), PipelineState::Unstarted);
        assert_eq!(
            engine.push_pipeline(VIDEO_SRC_NAME).unwrap().state(),
            PipelineState::Unstarted
        );
    }
}
