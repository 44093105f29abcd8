//! Video rendering graphs per deployment target
//!
//! The H.264 input stage of the video pipeline is fixed; everything
//! downstream of it depends on what the target can decode and display.

use serde::{Deserialize, Serialize};

/// Builds the part of the video pipeline that sits after the input stage.
pub trait VideoSinkBuilder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Launch fragment fed by byte-stream H.264 access units
    fn render_graph(&self) -> String;
}

/// Software decode, platform-chosen sink
pub struct AutoVideoSink;

impl VideoSinkBuilder for AutoVideoSink {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn render_graph(&self) -> String {
        "h264parse ! avdec_h264 ! videoconvert ! autovideosink sync=false".to_string()
    }
}

/// VA-API hardware decode (Linux)
pub struct VaapiVideoSink;

impl VideoSinkBuilder for VaapiVideoSink {
    fn name(&self) -> &'static str {
        "vaapi"
    }

    fn render_graph(&self) -> String {
        "h264parse ! vaapih264dec ! vaapisink sync=false".to_string()
    }
}

/// VideoToolbox hardware decode (macOS)
pub struct VideoToolboxSink;

impl VideoSinkBuilder for VideoToolboxSink {
    fn name(&self) -> &'static str {
        "videotoolbox"
    }

    fn render_graph(&self) -> String {
        "h264parse ! vtdec ! videoconvert ! osxvideosink sync=false".to_string()
    }
}

/// Direct3D 11 hardware decode (Windows)
pub struct D3d11VideoSink;

impl VideoSinkBuilder for D3d11VideoSink {
    fn name(&self) -> &'static str {
        "d3d11"
    }

    fn render_graph(&self) -> String {
        "h264parse ! d3d11h264dec ! d3d11videosink sync=false".to_string()
    }
}

/// Graph given verbatim in the configuration
pub struct CustomVideoSink {
    graph: String,
}

impl CustomVideoSink {
    pub fn new(graph: impl Into<String>) -> Self {
        Self {
            graph: graph.into(),
        }
    }
}

impl VideoSinkBuilder for CustomVideoSink {
    fn name(&self) -> &'static str {
        "custom"
    }

    fn render_graph(&self) -> String {
        self.graph.clone()
    }
}

/// Video output selection as it appears in the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VideoOutput {
    Auto,
    Vaapi,
    VideoToolbox,
    D3d11,
    Custom { graph: String },
}

impl VideoOutput {
    pub fn builder(&self) -> Box<dyn VideoSinkBuilder> {
        match self {
            VideoOutput::Auto => Box::new(AutoVideoSink),
            VideoOutput::Vaapi => Box::new(VaapiVideoSink),
            VideoOutput::VideoToolbox => Box::new(VideoToolboxSink),
            VideoOutput::D3d11 => Box::new(D3d11VideoSink),
            VideoOutput::Custom { graph } => Box::new(CustomVideoSink::new(graph.as_str())),
        }
    }
}

impl Default for VideoOutput {
    #[cfg(target_os = "macos")]
    fn default() -> Self {
        VideoOutput::VideoToolbox
    }

    #[cfg(target_os = "windows")]
    fn default() -> Self {
        VideoOutput::D3d11
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn default() -> Self {
        VideoOutput::Auto
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_output_renders_h264() {
        let outputs = [
            VideoOutput::Auto,
            VideoOutput::Vaapi,
            VideoOutput::VideoToolbox,
            VideoOutput::D3d11,
        ];
        for output in outputs {
            let graph = output.builder().render_graph();
            assert!(graph.starts_with("h264parse ! "), "{}", graph);
            assert!(graph.ends_with("sync=false"), "{}", graph);
        }
    }

    #[test]
    fn test_custom_output_is_verbatim() {
        let output: VideoOutput =
            serde_json::from_str(r#"{"kind":"custom","graph":"fakesink"}"#).unwrap();
        let builder = output.builder();
        assert_eq!(builder.name(), "custom");
        assert_eq!(builder.render_graph(), "fakesink");
    }

    #[test]
    fn test_output_names_parse() {
        let output: VideoOutput = serde_json::from_str(r#"{"kind":"video_toolbox"}"#).unwrap();
        assert_eq!(output, VideoOutput::VideoToolbox);
        assert_eq!(output.builder().name(), "videotoolbox");
    }
}
