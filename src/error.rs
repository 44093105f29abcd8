//! Error type shared by the controllers, the engines and the runtime

use crate::pipeline::MediaKind;
#[cfg(feature = "gstreamer")]
use gstreamer as gst;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} buffer received before the stream format was announced")]
    NotStarted(MediaKind),
    #[error("audio buffer received with no compression variant recorded")]
    CompressionUnset,
    #[error("no media playlist pipeline to seek")]
    NoPlaylist,
    #[error("invalid seek position: {0}s")]
    InvalidPosition(f64),
    #[error("pipeline '{0}' has no input stage")]
    NoInputStage(String),
    #[error("media engine: {0}")]
    Engine(String),
    #[error("media engine already initialized")]
    AlreadyInitialized,
    #[error("media engine was shut down for this process")]
    ShutDown,
    #[error("media engine {found} is older than the required {required}")]
    UnsupportedVersion { found: String, required: String },
    #[error("failed to lock internal sync primitive")]
    Lock,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Glib(#[from] gst::glib::Error),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Bool(#[from] gst::glib::BoolError),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    StateChange(#[from] gst::StateChangeError),
    #[cfg(feature = "gstreamer")]
    #[error("{0}")]
    Flow(#[from] gst::FlowError),
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Error::Lock
    }
}
