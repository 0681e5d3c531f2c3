//! Display implementation for dcplus messages.
//!
//! All user-facing and log text lives here, so wording stays consistent
//! between the console output of interactive commands and `overlay.log`.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === MONITOR MESSAGES ===
            Message::MonitorEnumerationFallback(reason) => {
                format!("Primary monitor enumeration failed ({}), trying display devices", reason)
            }
            Message::MonitorEnumerationFailed(reason) => format!("Monitor enumeration failed: {}", reason),
            Message::MonitorDetected(index, geometry) => format!("Monitor {}: {}", index, geometry),
            Message::NoMonitorsDetected => "No monitors detected, nothing to protect".to_string(),
            Message::InvalidMonitorGeometry(geometry) => format!("Skipping monitor with empty geometry {}", geometry),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigCreated(path) => format!("Created default configuration at {}", path),
            Message::ConfigSaveFailed(error) => format!("Failed to save configuration: {}", error),
            Message::ConfigUnusable(error) => format!("Configuration unusable, overlays paused: {}", error),
            Message::ConfigChanged => "Configuration changed, restarting the idle wait".to_string(),

            // === INPUT SOURCE MESSAGES ===
            Message::SourceStarted(name) => format!("Started {} source", name),
            Message::SourceStopped(name) => format!("Stopped {} source", name),
            Message::SourceUnavailable(error) => error.clone(),
            Message::HookListenFailed(error) => format!("Input hook failed: {}. Retrying in 1 second...", error),
            Message::KeyboardActivity => "Keyboard activity".to_string(),
            Message::MouseActivity(x, y) => format!("Mouse activity at ({}, {})", x, y),
            Message::GamepadActivity => "Controller activity".to_string(),
            Message::GamepadBackendLoaded(library) => format!("Controller support loaded from {}", library),

            // === ACTIVITY MESSAGES ===
            Message::IdleSummary { system_secs, monitors } => {
                format!("System idle {}s, tracking {} monitor(s)", system_secs, monitors)
            }
            Message::DetectionConfigured(detection) => format!("Detection settings applied: {}", detection),

            // === SCHEDULER MESSAGES ===
            Message::SchedulerDisabled => "Overlays are disabled in the configuration".to_string(),
            Message::SchedulerStopped => "Scheduler stopped".to_string(),
            Message::WaitStarted { timeout_secs, targets } => {
                format!("Waiting for {}s of inactivity on {} monitor(s)", timeout_secs, targets)
            }
            Message::OverlaysTriggered(count) => format!("Inactivity timeout reached, showing {} overlay(s)", count),
            Message::OverlaysDismissed(count) => format!("Input detected, closed {} overlay(s)", count),
            Message::OverlayLaunchFailed(error) => error.clone(),
            Message::OverlayExited(geometry) => format!("Overlay on monitor {} exited on its own", geometry),
            Message::OverlayMediaMissing(geometry) => {
                format!("No media files configured, monitor {} falls back to a blank overlay", geometry)
            }
            Message::RendererMissing(path) => format!("Overlay renderer not found at {}", path),

            // === INSTANCE MESSAGES ===
            Message::MarkerAcquired(pid) => format!("Process marker written (PID: {})", pid),
            Message::MarkerReleased(pid) => format!("Process marker removed (PID: {})", pid),
            Message::MarkerReleaseFailed(error) => format!("Failed to remove process marker: {}", error),
            Message::StaleMarkerCleared(error) => format!("Cleared {}", error),
            Message::InvalidMarkerContent(content) => format!("Cleared unreadable process marker: '{}'", content),

            // === BACKGROUND PROCESS MESSAGES ===
            Message::BackgroundStarted(pid) => format!("Background scheduler started (PID: {})", pid),
            Message::BackgroundStopped => "Background scheduler exited".to_string(),
            Message::AlreadyRunning(pid) => format!("Background scheduler is already running (PID: {})", pid),
            Message::ReceivedSigterm => "Received SIGTERM, shutting down gracefully...".to_string(),
            Message::ReceivedSigint => "Received SIGINT, shutting down gracefully...".to_string(),
            Message::ReceivedCtrlC => "Received Ctrl+C, shutting down gracefully...".to_string(),
            Message::SignalHandlerFailed(error) => format!("Failed to install signal handler: {}", error),
            Message::SignalHandlingNotSupported => "Signal handling not supported on this platform".to_string(),

            // === PREVIEW MESSAGES ===
            Message::PreviewStarted(count) => format!("Previewing {} overlay(s) for 3 seconds...", count),
            Message::PreviewFinished => "Preview finished".to_string(),
            Message::NoPreviewTargets => "No monitors selected, nothing to preview".to_string(),

            // === STATUS MESSAGES ===
            Message::StatusHeader(time) => format!("Display Control+ status ({})", time),
            Message::StatusConfigPath(path) => format!("Configuration: {}", path),
            Message::StatusRunning(pid) => format!("Background scheduler: running (PID: {})", pid),
            Message::StatusNotRunning => "Background scheduler: not running".to_string(),
            Message::StatusDisabled => "Overlays: disabled".to_string(),
            Message::StatusTimeout { seconds, scope, detection } => {
                format!("Overlays: after {}s of inactivity (scope: {}, detection: {})", seconds, scope, detection)
            }
            Message::StatusMonitor { index, geometry, target } => {
                let marker = if *target { " [protected]" } else { "" };
                format!("  Monitor {}: {} {}x{}{}", index, geometry, geometry.width(), geometry.height(), marker)
            }
            Message::StatusRenderer(path) => format!("Renderer: {}", path),
        };

        write!(f, "{}", text)
    }
}
