//! GStreamer backend

use super::{MediaEngine, MediaPipeline, PipelineSpec, SeekFlags, has_scheme};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use log::{debug, info, warn};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct GstEngine;

impl GstEngine {
    pub fn new() -> Self {
        GstEngine
    }

    fn build_push(&self, name: &str, caps: &str, graph: &str) -> Result<GstPipeline> {
        let launch = format!("appsrc name={} ! {}", name, graph);
        let pipeline = gst::parse::launch(&launch)?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Engine(format!("'{}' is not a pipeline", launch)))?;

        let appsrc = pipeline
            .by_name(name)
            .and_then(|elem| elem.downcast::<gst_app::AppSrc>().ok())
            .ok_or_else(|| Error::NoInputStage(name.to_string()))?;

        appsrc.set_stream_type(gst_app::AppStreamType::Stream);
        appsrc.set_caps(Some(&gst::Caps::from_str(caps)?));
        appsrc.set_is_live(true);
        appsrc.set_format(gst::Format::Time);
        appsrc.set_property("emit-signals", true);

        Ok(GstPipeline {
            name: name.to_string(),
            pipeline,
            appsrc: Some(appsrc),
        })
    }

    fn build_playlist(&self, uri: &str, element: &str) -> Result<GstPipeline> {
        if !has_scheme(uri) {
            return Err(Error::Engine(format!("invalid playlist URI '{}'", uri)));
        }

        let pipeline = gst::ElementFactory::make(element)
            .property("uri", uri)
            .build()?
            .downcast::<gst::Pipeline>()
            .map_err(|_| Error::Engine(format!("'{}' is not a pipeline element", element)))?;

        Ok(GstPipeline {
            name: element.to_string(),
            pipeline,
            appsrc: None,
        })
    }
}

impl MediaEngine for GstEngine {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    fn init(&self, config: &EngineConfig) -> Result<()> {
        gst::init()?;

        let (major, minor, micro, _) = gst::version();
        if (major, minor) < config.min_version {
            return Err(Error::UnsupportedVersion {
                found: format!("{}.{}.{}", major, minor, micro),
                required: format!("{}.{}", config.min_version.0, config.min_version.1),
            });
        }

        gst::log::set_threshold_from_string(&config.debug_level, true);

        let registry = gst::Registry::get();
        for path in &config.plugin_paths {
            if !registry.scan_path(path) {
                warn!("GstEngine: no new plugins found in {}", path.display());
            }
        }

        info!("GstEngine: GStreamer {}.{}.{} ready", major, minor, micro);
        Ok(())
    }

    fn shutdown(&self) {
        // SAFETY: MediaRuntime calls this once, after which no GStreamer
        // object is created in this process.
        unsafe {
            gst::deinit();
        }
    }

    fn build(&self, spec: &PipelineSpec) -> Result<Box<dyn MediaPipeline>> {
        debug!("GstEngine: building {}", spec.launch_line());
        let pipeline = match spec {
            PipelineSpec::Push { name, caps, graph } => self.build_push(name, caps, graph)?,
            PipelineSpec::Playlist { uri, element } => self.build_playlist(uri, element)?,
        };
        Ok(Box::new(pipeline))
    }
}

pub struct GstPipeline {
    name: String,
    pipeline: gst::Pipeline,
    appsrc: Option<gst_app::AppSrc>,
}

impl MediaPipeline for GstPipeline {
    fn start(&self) -> Result<()> {
        self.pipeline.set_state(gst::State::Playing)?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.pipeline.set_state(gst::State::Paused)?;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.pipeline.set_state(gst::State::Null)?;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.pipeline.current_state() == gst::State::Playing
    }

    fn push(&self, buffer: Bytes) -> Result<()> {
        let appsrc = self
            .appsrc
            .as_ref()
            .ok_or_else(|| Error::NoInputStage(self.name.clone()))?;
        appsrc.push_buffer(gst::Buffer::from_slice(buffer))?;
        Ok(())
    }

    fn seek(&self, position: Duration, flags: SeekFlags) -> Result<()> {
        let mut seek_flags = gst::SeekFlags::empty();
        if flags.flush {
            seek_flags |= gst::SeekFlags::FLUSH;
        }
        if flags.key_unit {
            seek_flags |= gst::SeekFlags::KEY_UNIT;
        }
        let nanos = u64::try_from(position.as_nanos())
            .ok()
            .filter(|nanos| *nanos <= gst::ClockTime::MAX.nseconds())
            .ok_or_else(|| Error::InvalidPosition(position.as_secs_f64()))?;
        self.pipeline
            .seek_simple(seek_flags, gst::ClockTime::from_nseconds(nanos))?;
        Ok(())
    }

    fn query_duration(&self) -> Option<Duration> {
        self.pipeline
            .query_duration::<gst::ClockTime>()
            .map(|d| Duration::from_nanos(d.nseconds()))
    }

    fn query_position(&self) -> Option<Duration> {
        self.pipeline
            .query_position::<gst::ClockTime>()
            .map(|p| Duration::from_nanos(p.nseconds()))
    }
}

impl Drop for GstPipeline {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            warn!("GstPipeline {}: failed to release: {}", self.name, e);
        }
    }
}
