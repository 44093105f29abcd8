//! Pipeline state management

use std::time::Instant;

/// Pipeline state machine
///
/// Mirrors the lifecycle of an engine pipeline handle. Stopped pipelines may be
/// played again, which is how video and playlist pipelines restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Built but never started
    Unstarted,

    /// Actively rendering
    Playing {
        /// When the pipeline last entered Playing
        since: Instant,
    },

    /// Paused (can resume to Playing)
    Paused {
        /// When the pipeline was paused
        since: Instant,
    },

    /// Stopped; resources released by the engine
    Stopped,
}

impl PipelineState {
    pub fn playing() -> Self {
        PipelineState::Playing {
            since: Instant::now(),
        }
    }

    pub fn paused() -> Self {
        PipelineState::Paused {
            since: Instant::now(),
        }
    }

    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, target) {
            (Unstarted, Playing { .. }) => true,
            (Unstarted, Stopped) => true,

            (Playing { .. }, Paused { .. }) => true,
            (Playing { .. }, Stopped) => true,

            (Paused { .. }, Playing { .. }) => true,
            (Paused { .. }, Stopped) => true,

            // Restart
            (Stopped, Playing { .. }) => true,

            (Playing { .. }, Playing { .. }) => true,
            (Paused { .. }, Paused { .. }) => true,
            (a, b) if a == b => true,

            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            PipelineState::Unstarted => "Unstarted",
            PipelineState::Playing { .. } => "Playing",
            PipelineState::Paused { .. } => "Paused",
            PipelineState::Stopped => "Stopped",
        }
    }

    /// Check if the pipeline is playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PipelineState::Playing { .. })
    }

    /// Check if the pipeline is paused
    pub fn is_paused(&self) -> bool {
        matches!(self, PipelineState::Paused { .. })
    }

    /// Check if the pipeline is playing or paused
    pub fn is_active(&self) -> bool {
        self.is_playing() || self.is_paused()
    }

    /// Get the duration since the pipeline started playing (if playing)
    pub fn playing_duration(&self) -> Option<std::time::Duration> {
        if let PipelineState::Playing { since } = self {
            Some(since.elapsed())
        } else {
            None
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
