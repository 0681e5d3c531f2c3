//! Error taxonomy for the idle-detection and overlay-scheduling core.
//!
//! None of these errors is fatal to the background process. Each one maps to a
//! degraded mode: a missing input source contributes nothing, an invalid config
//! parks the scheduler in its disabled state, a failed renderer launch leaves
//! that monitor uncovered for the current cycle.

use crate::libs::monitors::MonitorGeometry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DcError {
    /// An input backend (hook, gamepad, raw input) could not be initialised.
    #[error("{source_name} input source unavailable: {reason}")]
    SourceUnavailable { source_name: &'static str, reason: String },

    /// The config file is missing, unreadable or not valid JSON.
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),

    /// Neither enumeration mechanism produced a monitor list.
    #[error("monitor enumeration failed: {0}")]
    EnumerationFailure(String),

    /// One monitor's overlay renderer did not start.
    #[error("overlay renderer for monitor {geometry} failed to start: {reason}")]
    RendererLaunchFailure { geometry: MonitorGeometry, reason: String },

    /// The marker file pointed at a process that no longer exists.
    #[error("stale process marker for PID {0}")]
    StaleLock(u32),

    /// Another background instance holds the marker.
    #[error("background instance already running (PID {0})")]
    AlreadyRunning(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DcError {
    pub fn source_unavailable(source_name: &'static str, reason: impl Into<String>) -> Self {
        DcError::SourceUnavailable {
            source_name,
            reason: reason.into(),
        }
    }
}
