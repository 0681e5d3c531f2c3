//! Overlay tasks and the renderer collaborator.
//!
//! The core never draws. It decides which monitors need covering and hands an
//! [`OverlayTask`] per monitor to a [`Renderer`], which returns a handle the
//! scheduler owns until dismissal. The production renderer runs every overlay
//! in its own child process so a crash on one monitor cannot take down the
//! others, and dismissal is a forced kill.

use crate::libs::config::SchedulerConfig;
use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::libs::monitors::MonitorGeometry;
use crate::msg_warning;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// What the overlay shows.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    /// Solid black.
    #[default]
    Blank,
    /// One still image.
    Single,
    /// Images cycled every `interval` seconds.
    Slideshow,
    /// One animated GIF.
    Gif,
}

impl OverlayMode {
    pub fn needs_media(self) -> bool {
        !matches!(self, OverlayMode::Blank)
    }
}

/// Everything a renderer needs to cover one monitor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OverlayTask {
    pub monitor_geometry: MonitorGeometry,
    pub mode: OverlayMode,
    pub media_paths: Vec<String>,
    pub interval_seconds: u64,
    /// Preview overlays close on their own after a few seconds.
    pub demo: bool,
}

impl OverlayTask {
    /// Builds a task, picking the media each mode consumes.
    ///
    /// Single-image and GIF modes use the first path, slideshows use all of
    /// them. A media mode without any file degrades to a blank overlay.
    pub fn new(geometry: MonitorGeometry, mode: OverlayMode, file_paths: &[String], interval_seconds: u64, demo: bool) -> Self {
        let (mode, media_paths) = match mode {
            OverlayMode::Blank => (OverlayMode::Blank, Vec::new()),
            _ if file_paths.is_empty() => {
                msg_warning!(Message::OverlayMediaMissing(geometry));
                (OverlayMode::Blank, Vec::new())
            }
            OverlayMode::Single | OverlayMode::Gif => (mode, file_paths[..1].to_vec()),
            OverlayMode::Slideshow => (mode, file_paths.to_vec()),
        };

        OverlayTask {
            monitor_geometry: geometry,
            mode,
            media_paths,
            interval_seconds,
            demo,
        }
    }
}

/// A monitor selected for covering, with its enumeration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayTarget {
    pub index: usize,
    pub geometry: MonitorGeometry,
}

/// Resolves the configured monitor selection against the current topology.
///
/// Stored geometries win, since the GUI saves exactly the rectangles the user
/// picked. Without them the stored indices are looked up in `monitors`, and
/// with no selection at all every monitor is covered.
pub fn resolve_targets(config: &SchedulerConfig, monitors: &[MonitorGeometry]) -> Vec<OverlayTarget> {
    let targets: Vec<OverlayTarget> = if !config.target_monitors.is_empty() {
        config
            .target_monitors
            .iter()
            .enumerate()
            .map(|(position, geometry)| OverlayTarget {
                index: config.target_monitor_indices.get(position).copied().unwrap_or(position),
                geometry: *geometry,
            })
            .collect()
    } else if !config.target_monitor_indices.is_empty() {
        config
            .target_monitor_indices
            .iter()
            .filter_map(|&index| monitors.get(index).map(|geometry| OverlayTarget { index, geometry: *geometry }))
            .collect()
    } else {
        monitors
            .iter()
            .enumerate()
            .map(|(index, geometry)| OverlayTarget { index, geometry: *geometry })
            .collect()
    };

    targets
        .into_iter()
        .filter(|target| {
            let valid = target.geometry.is_valid();
            if !valid {
                msg_warning!(Message::InvalidMonitorGeometry(target.geometry));
            }
            valid
        })
        .collect()
}

/// One task per target, with per-monitor mode overrides applied.
pub fn build_tasks(config: &SchedulerConfig, targets: &[OverlayTarget], demo: bool) -> Vec<OverlayTask> {
    targets
        .iter()
        .map(|target| {
            OverlayTask::new(
                target.geometry,
                config.mode_for(target.index),
                &config.file_paths,
                config.interval_seconds,
                demo,
            )
        })
        .collect()
}

/// The collaborator that puts pixels on screen.
pub trait Renderer {
    type Handle: Send;

    /// Starts an overlay for one monitor.
    fn show(&self, task: &OverlayTask) -> Result<Self::Handle, DcError>;

    /// Whether the overlay is still running.
    fn is_alive(&self, handle: &mut Self::Handle) -> bool;

    /// Stops the overlay immediately. Must tolerate an overlay that already exited.
    fn terminate(&self, handle: Self::Handle);
}

/// Runs each overlay as a child process of an external renderer executable.
///
/// The task is passed as JSON in the `--task` argument.
#[derive(Debug, Clone)]
pub struct ProcessRenderer {
    program: PathBuf,
}

impl ProcessRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// `dcplus-overlay` in the directory of the running executable.
    pub fn default_program() -> PathBuf {
        let file_name = format!("dcplus-overlay{}", std::env::consts::EXE_SUFFIX);
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(&file_name)))
            .unwrap_or_else(|| PathBuf::from(file_name))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Renderer for ProcessRenderer {
    type Handle = Child;

    fn show(&self, task: &OverlayTask) -> Result<Child, DcError> {
        let launch_failure = |reason: String| DcError::RendererLaunchFailure {
            geometry: task.monitor_geometry,
            reason,
        };
        let payload = serde_json::to_string(task).map_err(|e| launch_failure(e.to_string()))?;

        let mut command = Command::new(&self.program);
        command
            .arg("--task")
            .arg(payload)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        command
            .spawn()
            .map_err(|e| launch_failure(format!("{}: {}", self.program.display(), e)))
    }

    fn is_alive(&self, handle: &mut Child) -> bool {
        matches!(handle.try_wait(), Ok(None))
    }

    fn terminate(&self, mut handle: Child) {
        if self.is_alive(&mut handle) {
            let _ = handle.kill();
        }
        // Reap so no zombie is left behind.
        let _ = handle.wait();
    }
}
