//! Configuration store shared with the settings GUI.
//!
//! The settings GUI writes `config.json` in the application data directory and
//! the background scheduler re-reads it on every poll cycle, so edits apply
//! without a restart. A parse failure is retried a few times before the file
//! is declared invalid, since the GUI may be halfway through saving it.
//!
//! ## Default object
//!
//! Every key is optional. Missing keys take these values:
//!
//! ```json
//! {
//!   "enabled": true,
//!   "timeout": 5,
//!   "mode": "blank",
//!   "monitors": [],
//!   "monitor_indices": [],
//!   "file_paths": [],
//!   "interval": 30,
//!   "scope": "system",
//!   "detection_mode": "input",
//!   "monitor_modes": {},
//!   "controller": {
//!     "enabled": true,
//!     "rawinput": false,
//!     "stick_deadzone": 7849,
//!     "trigger_threshold": 30
//!   }
//! }
//! ```
//!
//! Keys the core does not consume (for example `auto_update_enabled`) are
//! ignored on read.

use super::data_storage::DataStorage;
use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::libs::monitors::{MonitorEnumerator, MonitorGeometry};
use crate::libs::overlay::OverlayMode;
use crate::{msg_info, msg_warning};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file name inside the application data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Reads attempted before a malformed file is reported as invalid.
const READ_ATTEMPTS: u32 = 3;
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Timeout used when the stored value is not a usable number of minutes.
const FALLBACK_TIMEOUT_SECS: u64 = 300;

/// Which signal classes feed the system idle value.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    /// Hook-derived idle, clamped by the OS last-input gauge.
    #[default]
    Input,
    /// Idle since the last accepted event of any kind.
    Activity,
    /// The smaller of the two.
    Both,
}

/// Whether idle time is tracked once for the whole system or per monitor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdleScopeMode {
    #[default]
    #[serde(rename = "system")]
    System,
    #[serde(rename = "per-monitor")]
    PerMonitor,
}

/// Gamepad-related detection settings.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Poll XInput controllers for activity.
    pub enabled: bool,
    /// Additionally treat any raw HID message as activity.
    pub rawinput: bool,
    /// Stick axis magnitude that must be exceeded to count as movement.
    pub stick_deadzone: i32,
    /// Trigger value that must be exceeded to count as a press.
    pub trigger_threshold: i32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            enabled: true,
            rawinput: false,
            stick_deadzone: 7849,
            trigger_threshold: 30,
        }
    }
}

/// The persisted configuration object, exactly as the settings GUI writes it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub enabled: bool,

    /// Inactivity timeout in minutes. Fractions are allowed.
    #[serde(deserialize_with = "lenient_minutes")]
    pub timeout: f64,

    pub mode: OverlayMode,

    /// Geometries of the monitors the user selected.
    pub monitors: Vec<MonitorGeometry>,

    /// Enumeration indices of the selected monitors, parallel to `monitors`.
    pub monitor_indices: Vec<usize>,

    pub file_paths: Vec<String>,

    /// Slideshow interval in seconds.
    pub interval: u64,

    pub scope: IdleScopeMode,

    pub detection_mode: DetectionMode,

    /// Per-monitor overlay mode overrides keyed by monitor index (`"0"`, `"1"`, ...).
    pub monitor_modes: BTreeMap<String, OverlayMode>,

    pub controller: ControllerConfig,

    /// Renderer executable. Defaults to `dcplus-overlay` next to this binary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enabled: true,
            timeout: 5.0,
            mode: OverlayMode::Blank,
            monitors: Vec::new(),
            monitor_indices: Vec::new(),
            file_paths: Vec::new(),
            interval: 30,
            scope: IdleScopeMode::System,
            detection_mode: DetectionMode::Input,
            monitor_modes: BTreeMap::new(),
            controller: ControllerConfig::default(),
            renderer: None,
        }
    }
}

impl Config {
    /// Default configuration selecting every given monitor.
    pub fn with_monitors(monitors: &[MonitorGeometry]) -> Self {
        Config {
            monitors: monitors.to_vec(),
            monitor_indices: (0..monitors.len()).collect(),
            ..Config::default()
        }
    }

    pub fn detection(&self) -> DetectionConfig {
        DetectionConfig {
            mode: self.detection_mode,
            scope: self.scope,
            controller_enabled: self.controller.enabled,
            controller_use_raw_input: self.controller.enabled && self.controller.rawinput,
            stick_deadzone: self.controller.stick_deadzone,
            trigger_threshold: self.controller.trigger_threshold,
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::from(self)
    }
}

/// Accepts minutes as a JSON number or a numeric string; anything else becomes NaN
/// and is mapped to the fallback timeout when converted.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

/// Idle-detection settings applied to the activity aggregator as one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectionConfig {
    pub mode: DetectionMode,
    pub scope: IdleScopeMode,
    pub controller_enabled: bool,
    pub controller_use_raw_input: bool,
    pub stick_deadzone: i32,
    pub trigger_threshold: i32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Config::default().detection()
    }
}

/// The view of the config the scheduler works from during one wait cycle.
///
/// Compared structurally on every poll; any difference restarts the wait.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub timeout_minutes: f64,
    pub mode: OverlayMode,
    pub target_monitors: Vec<MonitorGeometry>,
    pub target_monitor_indices: Vec<usize>,
    pub file_paths: Vec<String>,
    pub interval_seconds: u64,
    pub scope: IdleScopeMode,
    pub detection_mode: DetectionMode,
    pub monitor_modes: BTreeMap<String, OverlayMode>,
    pub detection: DetectionConfig,
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        // NaN never compares equal, which would restart the wait on every poll.
        let timeout_minutes = if config.timeout.is_finite() && config.timeout >= 0.0 {
            config.timeout
        } else {
            FALLBACK_TIMEOUT_SECS as f64 / 60.0
        };
        SchedulerConfig {
            enabled: config.enabled,
            timeout_minutes,
            mode: config.mode,
            target_monitors: config.monitors.clone(),
            target_monitor_indices: config.monitor_indices.clone(),
            file_paths: config.file_paths.clone(),
            interval_seconds: config.interval,
            scope: config.scope,
            detection_mode: config.detection_mode,
            monitor_modes: config.monitor_modes.clone(),
            detection: config.detection(),
        }
    }
}

impl SchedulerConfig {
    /// Idle duration that triggers the overlays, truncated to whole seconds.
    pub fn timeout(&self) -> Duration {
        let seconds = self.timeout_minutes * 60.0;
        if seconds.is_finite() && seconds >= 0.0 {
            Duration::from_secs(seconds as u64)
        } else {
            Duration::from_secs(FALLBACK_TIMEOUT_SECS)
        }
    }

    /// Overlay mode for the monitor at `index`, honouring per-monitor overrides.
    pub fn mode_for(&self, index: usize) -> OverlayMode {
        self.monitor_modes.get(&index.to_string()).copied().unwrap_or(self.mode)
    }
}

/// Reads and writes `config.json`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store located in the per-user application data directory.
    pub fn new() -> Result<Self, DcError> {
        let path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        Ok(Self { path })
    }

    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config file.
    ///
    /// Returns `Ok(None)` when the file does not exist. A file that fails to
    /// parse is re-read up to `READ_ATTEMPTS` times before giving up, since the
    /// GUI may be in the middle of rewriting it. Blocks the calling thread
    /// between attempts; async callers use [`read_async`](Self::read_async).
    pub fn read(&self) -> Result<Option<Config>, DcError> {
        let mut last_error = String::new();
        for attempt in 1..=READ_ATTEMPTS {
            match self.read_once()? {
                Ok(config) => return Ok(config),
                Err(e) => last_error = e,
            }
            if attempt < READ_ATTEMPTS {
                std::thread::sleep(READ_RETRY_DELAY);
            }
        }
        Err(self.invalid(last_error))
    }

    /// [`read`](Self::read) with the retry delay spent on the tokio timer.
    pub async fn read_async(&self) -> Result<Option<Config>, DcError> {
        let mut last_error = String::new();
        for attempt in 1..=READ_ATTEMPTS {
            match self.read_once()? {
                Ok(config) => return Ok(config),
                Err(e) => last_error = e,
            }
            if attempt < READ_ATTEMPTS {
                tokio::time::sleep(READ_RETRY_DELAY).await;
            }
        }
        Err(self.invalid(last_error))
    }

    /// One read attempt. The inner error is a parse failure worth retrying.
    fn read_once(&self) -> Result<Result<Option<Config>, String>, DcError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ok(None)),
            Err(e) => return Err(self.invalid(e.to_string())),
        };
        Ok(serde_json::from_str::<Config>(&content).map(Some).map_err(|e| e.to_string()))
    }

    fn invalid(&self, reason: String) -> DcError {
        DcError::ConfigInvalid(format!("{}: {}", self.path.display(), reason))
    }

    /// Reads the config, creating a default file on first run.
    ///
    /// The default selects every monitor the enumerator currently reports.
    pub fn load(&self, enumerator: &dyn MonitorEnumerator) -> Result<Config, DcError> {
        match self.read()? {
            Some(config) => Ok(config),
            None => Ok(self.create_default(enumerator)),
        }
    }

    /// [`load`](Self::load) for callers running on the tokio runtime.
    pub async fn load_async(&self, enumerator: &dyn MonitorEnumerator) -> Result<Config, DcError> {
        match self.read_async().await? {
            Some(config) => Ok(config),
            None => Ok(self.create_default(enumerator)),
        }
    }

    fn create_default(&self, enumerator: &dyn MonitorEnumerator) -> Config {
        let config = Config::with_monitors(&enumerator.enumerate());
        match self.save(&config) {
            Ok(()) => msg_info!(Message::ConfigCreated(self.path.display().to_string())),
            Err(e) => msg_warning!(Message::ConfigSaveFailed(e.to_string())),
        }
        config
    }

    /// Writes the config as pretty-printed JSON.
    ///
    /// The file is written next to the target and renamed over it, so readers
    /// never see a half-written file produced by this process.
    pub fn save(&self, config: &Config) -> Result<(), DcError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config).map_err(|e| DcError::ConfigInvalid(e.to_string()))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}
