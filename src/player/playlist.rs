//! Media playlist controller
//!
//! Holds at most one pull pipeline. A new announcement stops the current
//! pipeline before the replacement starts; transport commands only ever act
//! on whatever occupies the slot when they run.

use crate::assets::SEEK_NANOS_PER_SECOND;
use crate::engine::{MediaEngine, MediaPipeline, PipelineSpec, SeekFlags};
use crate::error::{Error, Result};
use crate::pipeline::PlaybackInfo;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct PlaylistHandle {
    uri: String,
    pipeline: Box<dyn MediaPipeline>,
}

pub struct PlaylistController {
    engine: Arc<dyn MediaEngine>,
    element: String,
    slot: Mutex<Option<PlaylistHandle>>,
}

impl PlaylistController {
    pub fn new(engine: Arc<dyn MediaEngine>, element: impl Into<String>) -> Self {
        Self {
            engine,
            element: element.into(),
            slot: Mutex::new(None),
        }
    }

    /// Build and start a pipeline for `uri`, replacing the current one.
    ///
    /// A build failure leaves the current pipeline untouched; a start failure
    /// leaves the slot empty. The slot lock is never held while a pipeline
    /// changes state, so queries stay responsive during a replacement.
    pub fn on_playlist(&self, uri: &str) -> Result<()> {
        let pipeline = self
            .engine
            .build(&PipelineSpec::playlist(uri, self.element.as_str()))?;

        let previous = self.slot.lock()?.take();
        if let Some(previous) = previous {
            info!("PlaylistController: replacing {}", previous.uri);
            Self::release(previous);
        }

        pipeline.start()?;
        info!("PlaylistController: playing {}", uri);
        let raced = self.slot.lock()?.replace(PlaylistHandle {
            uri: uri.to_string(),
            pipeline,
        });
        // another announcement landed while this one was starting
        if let Some(raced) = raced {
            info!("PlaylistController: superseding {}", raced.uri);
            Self::release(raced);
        }
        Ok(())
    }

    fn release(handle: PlaylistHandle) {
        if let Err(e) = handle.pipeline.stop() {
            warn!("PlaylistController: failed to stop {}: {}", handle.uri, e);
        }
    }

    pub fn on_remove(&self) -> Result<()> {
        let Some(handle) = self.slot.lock()?.take() else {
            debug!("PlaylistController: remove with no playlist");
            return Ok(());
        };
        handle.pipeline.stop()?;
        info!("PlaylistController: removed {}", handle.uri);
        Ok(())
    }

    pub fn on_pause(&self) -> Result<()> {
        let slot = self.slot.lock()?;
        match slot.as_ref() {
            Some(handle) if handle.pipeline.is_playing() => {
                handle.pipeline.pause()?;
                debug!("PlaylistController: paused {}", handle.uri);
            }
            _ => debug!("PlaylistController: nothing playing to pause"),
        }
        Ok(())
    }

    pub fn on_resume(&self) -> Result<()> {
        let slot = self.slot.lock()?;
        match slot.as_ref() {
            Some(handle) if !handle.pipeline.is_playing() => {
                handle.pipeline.start()?;
                debug!("PlaylistController: resumed {}", handle.uri);
            }
            Some(_) => debug!("PlaylistController: already playing"),
            None => debug!("PlaylistController: no playlist to resume"),
        }
        Ok(())
    }

    /// Flushing, key-unit aligned seek to an absolute position.
    pub fn on_scrub(&self, position_seconds: f64) -> Result<()> {
        // u64::MAX nanoseconds is the engine's "no time" marker
        let nanos = position_seconds * SEEK_NANOS_PER_SECOND;
        if !position_seconds.is_finite() || position_seconds < 0.0 || nanos >= u64::MAX as f64 {
            return Err(Error::InvalidPosition(position_seconds));
        }

        let slot = self.slot.lock()?;
        let Some(handle) = slot.as_ref() else {
            warn!("PlaylistController: scrub to {}s with no playlist", position_seconds);
            return Err(Error::NoPlaylist);
        };

        let position = Duration::from_nanos(nanos as u64);
        handle.pipeline.seek(position, SeekFlags::FLUSH_KEY_UNIT)?;
        debug!("PlaylistController: seek {} to {:?}", handle.uri, position);
        Ok(())
    }

    /// Duration and position of the current playlist, `None` without one.
    pub fn playback_info(&self) -> Result<Option<PlaybackInfo>> {
        let slot = self.slot.lock()?;
        Ok(slot.as_ref().map(|handle| {
            PlaybackInfo::new(
                handle.pipeline.query_duration(),
                handle.pipeline.query_position(),
            )
        }))
    }

    pub fn uri(&self) -> Option<String> {
        self.slot
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|handle| handle.uri.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::pipeline::PipelineState;
    use bytes::Bytes;
    use std::sync::Barrier;

    /// Engine whose pipelines park in `stop()` until the test lets them go
    struct GatedEngine {
        inner: MemoryEngine,
        gate: Arc<Barrier>,
    }

    struct GatedPipeline {
        inner: Box<dyn MediaPipeline>,
        gate: Arc<Barrier>,
    }

    impl MediaEngine for GatedEngine {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn build(&self, spec: &PipelineSpec) -> Result<Box<dyn MediaPipeline>> {
            Ok(Box::new(GatedPipeline {
                inner: self.inner.build(spec)?,
                gate: Arc::clone(&self.gate),
            }))
        }
    }

    impl MediaPipeline for GatedPipeline {
        fn start(&self) -> Result<()> {
            self.inner.start()
        }

        fn pause(&self) -> Result<()> {
            self.inner.pause()
        }

        fn stop(&self) -> Result<()> {
            self.gate.wait();
            self.gate.wait();
            self.inner.stop()
        }

        fn is_playing(&self) -> bool {
            self.inner.is_playing()
        }

        fn push(&self, buffer: Bytes) -> Result<()> {
            self.inner.push(buffer)
        }

        fn seek(&self, position: Duration, flags: SeekFlags) -> Result<()> {
            self.inner.seek(position, flags)
        }

        fn query_duration(&self) -> Option<Duration> {
            self.inner.query_duration()
        }

        fn query_position(&self) -> Option<Duration> {
            self.inner.query_position()
        }
    }

    fn controller() -> (Arc<MemoryEngine>, PlaylistController) {
        let engine = Arc::new(MemoryEngine::new().with_playlist_duration(Duration::from_secs(120)));
        let playlist = PlaylistController::new(engine.clone(), "playbin3");
        (engine, playlist)
    }

    #[test]
    fn test_transport_without_playlist_is_noop() {
        let (engine, playlist) = controller();
        playlist.on_pause().unwrap();
        playlist.on_resume().unwrap();
        playlist.on_remove().unwrap();
        assert_eq!(playlist.playback_info().unwrap(), None);
        assert!(engine.pipelines().is_empty());
    }

    #[test]
    fn test_scrub_without_playlist_fails() {
        let (_engine, playlist) = controller();
        assert!(matches!(playlist.on_scrub(10.0), Err(Error::NoPlaylist)));
    }

    #[test]
    fn test_scrub_rejects_bad_positions() {
        let (_engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();
        assert!(matches!(playlist.on_scrub(-1.0), Err(Error::InvalidPosition(_))));
        assert!(matches!(playlist.on_scrub(f64::NAN), Err(Error::InvalidPosition(_))));
        assert!(matches!(playlist.on_scrub(f64::INFINITY), Err(Error::InvalidPosition(_))));
    }

    #[test]
    fn test_scrub_rejects_positions_beyond_clock_range() {
        let (engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();

        assert!(matches!(playlist.on_scrub(1.0e12), Err(Error::InvalidPosition(_))));
        assert!(matches!(playlist.on_scrub(f64::MAX), Err(Error::InvalidPosition(_))));
        assert!(engine.playlists()[0].seeks().is_empty());

        // largest representable range still seeks
        playlist.on_scrub(1.8e10).unwrap();
        let seeks = engine.playlists()[0].seeks();
        assert_eq!(seeks.len(), 1);
        assert!(seeks[0].0.as_nanos() < u64::MAX as u128);
    }

    #[test]
    fn test_replacement_does_not_block_queries() {
        let gate = Arc::new(Barrier::new(2));
        let engine = Arc::new(GatedEngine {
            inner: MemoryEngine::new(),
            gate: Arc::clone(&gate),
        });
        let playlist = Arc::new(PlaylistController::new(engine.clone(), "playbin3"));
        playlist.on_playlist("http://x/a.m3u8").unwrap();

        let replacer = {
            let playlist = Arc::clone(&playlist);
            std::thread::spawn(move || playlist.on_playlist("http://x/b.m3u8"))
        };

        // the replacer is now parked inside the old pipeline's stop()
        gate.wait();
        assert_eq!(playlist.playback_info().unwrap(), None);
        assert_eq!(playlist.uri(), None);
        gate.wait();

        replacer.join().unwrap().unwrap();
        assert_eq!(playlist.uri().as_deref(), Some("http://x/b.m3u8"));
        let built = engine.inner.playlists();
        assert_eq!(built[0].state(), PipelineState::Stopped);
        assert!(built[1].state().is_playing());
    }

    #[test]
    fn test_scrub_is_flushing_key_unit_seek() {
        let (engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();
        playlist.on_scrub(12.5).unwrap();

        let seeks = engine.playlists()[0].seeks();
        assert_eq!(seeks, vec![(Duration::from_millis(12_500), SeekFlags::FLUSH_KEY_UNIT)]);
    }

    #[test]
    fn test_pause_resume_toggle() {
        let (engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();
        let pipeline = engine.playlists().remove(0);

        playlist.on_pause().unwrap();
        assert!(pipeline.state().is_paused());
        playlist.on_pause().unwrap();
        assert!(pipeline.state().is_paused());

        playlist.on_resume().unwrap();
        assert!(pipeline.state().is_playing());
        playlist.on_resume().unwrap();
        assert!(pipeline.state().is_playing());
    }

    #[test]
    fn test_replacement_stops_previous() {
        let (engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();
        playlist.on_playlist("http://x/b.m3u8").unwrap();

        let built = engine.playlists();
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].state(), PipelineState::Stopped);
        assert!(built[1].state().is_playing());
        assert_eq!(playlist.uri().as_deref(), Some("http://x/b.m3u8"));
    }

    #[test]
    fn test_failed_build_keeps_current_playlist() {
        let (engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();

        assert!(matches!(playlist.on_playlist("no scheme"), Err(Error::Engine(_))));
        assert_eq!(playlist.uri().as_deref(), Some("http://x/a.m3u8"));
        assert!(engine.playlists()[0].state().is_playing());
    }

    #[test]
    fn test_remove_releases_pipeline() {
        let (engine, playlist) = controller();
        playlist.on_playlist("http://x/a.m3u8").unwrap();
        playlist.on_remove().unwrap();

        assert_eq!(engine.playlists()[0].state(), PipelineState::Stopped);
        assert_eq!(playlist.uri(), None);
        assert_eq!(playlist.playback_info().unwrap(), None);
    }
}
