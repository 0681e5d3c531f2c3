use crate::libs::monitors::MonitorGeometry;

#[derive(Debug, Clone)]
pub enum Message {
    // === MONITOR MESSAGES ===
    MonitorEnumerationFallback(String),
    MonitorEnumerationFailed(String),
    MonitorDetected(usize, MonitorGeometry),
    NoMonitorsDetected,
    InvalidMonitorGeometry(MonitorGeometry),

    // === CONFIGURATION MESSAGES ===
    ConfigCreated(String), // path
    ConfigSaveFailed(String),
    ConfigUnusable(String),
    ConfigChanged,

    // === INPUT SOURCE MESSAGES ===
    SourceStarted(&'static str),
    SourceStopped(&'static str),
    SourceUnavailable(String),
    HookListenFailed(String),
    KeyboardActivity,
    MouseActivity(i32, i32),
    GamepadActivity,
    GamepadBackendLoaded(String), // DLL name

    // === ACTIVITY MESSAGES ===
    IdleSummary { system_secs: u64, monitors: usize },
    DetectionConfigured(String),

    // === SCHEDULER MESSAGES ===
    SchedulerDisabled,
    SchedulerStopped,
    WaitStarted { timeout_secs: u64, targets: usize },
    OverlaysTriggered(usize),
    OverlaysDismissed(usize),
    OverlayLaunchFailed(String),
    OverlayExited(MonitorGeometry),
    OverlayMediaMissing(MonitorGeometry),
    RendererMissing(String), // path

    // === INSTANCE MESSAGES ===
    MarkerAcquired(u32),
    MarkerReleased(u32),
    MarkerReleaseFailed(String),
    StaleMarkerCleared(String),
    InvalidMarkerContent(String),

    // === BACKGROUND PROCESS MESSAGES ===
    BackgroundStarted(u32),
    BackgroundStopped,
    AlreadyRunning(u32),
    ReceivedSigterm,
    ReceivedSigint,
    ReceivedCtrlC,
    SignalHandlerFailed(String),
    SignalHandlingNotSupported,

    // === PREVIEW MESSAGES ===
    PreviewStarted(usize),
    PreviewFinished,
    NoPreviewTargets,

    // === STATUS MESSAGES ===
    StatusHeader(String), // local time
    StatusConfigPath(String),
    StatusRunning(u32),
    StatusNotRunning,
    StatusDisabled,
    StatusTimeout { seconds: u64, scope: String, detection: String },
    StatusMonitor { index: usize, geometry: MonitorGeometry, target: bool },
    StatusRenderer(String),
}
