//! Process-wide media engine lifecycle
//!
//! Engines such as GStreamer keep global state: they are initialized once per
//! process and cannot be brought back after a shutdown. `MediaRuntime` makes
//! both steps explicit and refuses any second attempt.

use super::MediaEngine;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const RUNNING: u8 = 2;
const SHUT_DOWN: u8 = 3;

static RUNTIME_STATE: AtomicU8 = AtomicU8::new(UNINITIALIZED);

/// Proof that the media engine was initialized for this process.
pub struct MediaRuntime {
    engine: Arc<dyn MediaEngine>,
    shut_down: bool,
}

impl MediaRuntime {
    /// Initialize `engine` for the whole process.
    ///
    /// Succeeds once per process. A failed initialization may be retried.
    pub fn init(engine: Arc<dyn MediaEngine>, config: &EngineConfig) -> Result<Self> {
        if let Err(current) = RUNTIME_STATE.compare_exchange(
            UNINITIALIZED,
            INITIALIZING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(match current {
                SHUT_DOWN => Error::ShutDown,
                _ => Error::AlreadyInitialized,
            });
        }

        if let Err(e) = engine.init(config) {
            RUNTIME_STATE.store(UNINITIALIZED, Ordering::Release);
            return Err(e);
        }

        RUNTIME_STATE.store(RUNNING, Ordering::Release);
        info!("MediaRuntime: {} engine initialized", engine.name());

        Ok(Self {
            engine,
            shut_down: false,
        })
    }

    pub fn engine(&self) -> Arc<dyn MediaEngine> {
        Arc::clone(&self.engine)
    }

    /// Tear the engine down. The process cannot initialize it again.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.engine.shutdown();
        RUNTIME_STATE.store(SHUT_DOWN, Ordering::Release);
        info!("MediaRuntime: {} engine shut down", self.engine.name());
    }
}

impl Drop for MediaRuntime {
    fn drop(&mut self) {
        if !self.shut_down {
            warn!("MediaRuntime dropped without shutdown");
            self.teardown();
        }
    }
}
