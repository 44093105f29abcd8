//! Audio pipeline controller
//!
//! One pipeline per compression variant. Both are started on the format
//! announcement and every buffer is routed by the recorded variant, so the
//! right sink is ready before the first frame arrives.

use crate::assets::{audio_caps, audio_decoder, audio_src_name};
use crate::engine::{MediaEngine, MediaPipeline, PipelineSpec};
use crate::error::{Error, Result};
use crate::pipeline::{AudioFormat, CompressionVariant, MediaKind, PipelineHealth};
use bytes::Bytes;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

const VARIANT_UNSET: u8 = 0;

/// Compression variant negotiated for the current audio session
pub struct StreamFormat {
    variant: AtomicU8,
}

impl StreamFormat {
    pub fn new() -> Self {
        Self {
            variant: AtomicU8::new(VARIANT_UNSET),
        }
    }

    pub fn set(&self, variant: CompressionVariant) {
        self.variant.store(variant.to_u8(), Ordering::Release);
    }

    pub fn get(&self) -> Option<CompressionVariant> {
        CompressionVariant::from_u8(self.variant.load(Ordering::Acquire))
    }

    pub fn clear(&self) {
        self.variant.store(VARIANT_UNSET, Ordering::Release);
    }
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self::new()
    }
}

struct AudioPipelines {
    alac: Box<dyn MediaPipeline>,
    aac_eld: Box<dyn MediaPipeline>,
}

impl AudioPipelines {
    fn route(&self, variant: CompressionVariant) -> &dyn MediaPipeline {
        match variant {
            CompressionVariant::Alac => self.alac.as_ref(),
            CompressionVariant::AacEld => self.aac_eld.as_ref(),
        }
    }

    fn start(&self) -> Result<()> {
        self.alac.start()?;
        self.aac_eld.start()
    }

    /// Stop both; the first failure is reported after both were attempted.
    fn stop(&self) -> Result<()> {
        let alac = self.alac.stop();
        let aac_eld = self.aac_eld.stop();
        alac.and(aac_eld)
    }
}

pub struct AudioController {
    engine: Arc<dyn MediaEngine>,
    audio_sink: String,
    format: StreamFormat,
    pipelines: Mutex<Option<AudioPipelines>>,
    health: Arc<PipelineHealth>,
}

impl AudioController {
    pub fn new(engine: Arc<dyn MediaEngine>, audio_sink: impl Into<String>) -> Self {
        Self {
            engine,
            audio_sink: audio_sink.into(),
            format: StreamFormat::new(),
            pipelines: Mutex::new(None),
            health: Arc::new(PipelineHealth::new()),
        }
    }

    fn spec(&self, variant: CompressionVariant) -> PipelineSpec {
        PipelineSpec::push(
            audio_src_name(variant),
            audio_caps(variant),
            format!(
                "{} ! audioconvert ! audioresample ! {} sync=false",
                audio_decoder(variant),
                self.audio_sink
            ),
        )
    }

    pub fn on_format(&self, format: &AudioFormat) -> Result<()> {
        let mut slot = self.pipelines.lock()?;

        if let Some(previous) = self.format.get()
            && previous != format.compression
        {
            warn!(
                "AudioController: compression changed {} -> {} mid-session, routing follows the new one",
                previous, format.compression
            );
        }
        self.format.set(format.compression);

        if slot.is_some() {
            debug!("AudioController: pipelines already running");
            return Ok(());
        }

        let pipelines = AudioPipelines {
            alac: self.engine.build(&self.spec(CompressionVariant::Alac))?,
            aac_eld: self.engine.build(&self.spec(CompressionVariant::AacEld))?,
        };
        if let Err(e) = pipelines.start() {
            if let Err(stop_err) = pipelines.stop() {
                warn!("AudioController: cleanup after failed start: {}", stop_err);
            }
            return Err(e);
        }

        *slot = Some(pipelines);
        info!("AudioController: started, routing {}", format.compression);
        Ok(())
    }

    pub fn on_buffer(&self, buffer: Bytes) -> Result<()> {
        let slot = self.pipelines.lock()?;

        let Some(variant) = self.format.get() else {
            self.health.record_rejected();
            error!(
                "AudioController: {} byte buffer with no compression variant announced",
                buffer.len()
            );
            return Err(Error::CompressionUnset);
        };
        let Some(pipelines) = slot.as_ref() else {
            self.health.record_rejected();
            warn!("AudioController: rejecting buffer, pipelines are not running");
            return Err(Error::NotStarted(MediaKind::Audio));
        };

        let size = buffer.len();
        if let Err(e) = pipelines.route(variant).push(buffer) {
            self.health.record_push_failure();
            return Err(e);
        }
        self.health.record_buffer(size);
        Ok(())
    }

    pub fn on_disconnect(&self) -> Result<()> {
        let mut slot = self.pipelines.lock()?;
        let Some(pipelines) = slot.take() else {
            debug!("AudioController: disconnect with nothing running");
            return Ok(());
        };

        self.format.clear();
        pipelines.stop()?;
        info!("AudioController: stopped ({})", self.health.summary());
        Ok(())
    }

    pub fn compression(&self) -> Option<CompressionVariant> {
        self.format.get()
    }

    pub fn is_running(&self) -> bool {
        self.pipelines
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn health(&self) -> Arc<PipelineHealth> {
        Arc::clone(&self.health)
    }
}
