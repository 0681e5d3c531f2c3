//! Single-instance guard for the background scheduler.
//!
//! The marker is a file holding the owner's PID on a single line. A marker
//! whose PID is not a live process is stale and gets removed on sight, so a
//! crash never locks the user out of the background mode.

use crate::libs::data_storage::DataStorage;
use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_warning};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const MARKER_FILE: &str = "dcplus-background.pid";

#[derive(Debug, Clone)]
pub struct InstanceGuard {
    marker: PathBuf,
}

impl InstanceGuard {
    /// Guard using the marker in the application data directory.
    pub fn new() -> Result<Self, DcError> {
        Ok(Self::at(DataStorage::new().get_path(MARKER_FILE)?))
    }

    pub fn at(marker: impl Into<PathBuf>) -> Self {
        Self { marker: marker.into() }
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// PID recorded in the marker, if any, without checking liveness.
    fn recorded_pid(&self) -> Result<Option<Result<u32, String>>, DcError> {
        match fs::read_to_string(&self.marker) {
            Ok(content) => {
                let content = content.trim();
                Ok(Some(content.parse::<u32>().map_err(|_| content.to_string())))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// PID of the live process holding the marker.
    ///
    /// Stale or unreadable markers are cleared and reported as `None`.
    pub fn running_pid(&self) -> Result<Option<u32>, DcError> {
        match self.recorded_pid()? {
            None => Ok(None),
            Some(Ok(pid)) if process_alive(pid) => Ok(Some(pid)),
            Some(Ok(pid)) => {
                msg_warning!(Message::StaleMarkerCleared(DcError::StaleLock(pid).to_string()));
                self.remove_marker()?;
                Ok(None)
            }
            Some(Err(content)) => {
                msg_warning!(Message::InvalidMarkerContent(content));
                self.remove_marker()?;
                Ok(None)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.running_pid(), Ok(Some(_)))
    }

    /// Claims the marker for this process.
    ///
    /// Fails with [`DcError::AlreadyRunning`] while the marker names a live process.
    /// The marker is released when the returned lock is dropped.
    pub fn acquire(&self) -> Result<InstanceLock, DcError> {
        if let Some(owner) = self.running_pid()? {
            return Err(DcError::AlreadyRunning(owner));
        }
        let pid = std::process::id();
        if let Some(parent) = self.marker.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.marker, pid.to_string())?;
        msg_debug!(Message::MarkerAcquired(pid));
        Ok(InstanceLock {
            guard: self.clone(),
            pid,
            released: false,
        })
    }

    /// Deletes the marker if this process owns it.
    pub fn release(&self) -> Result<(), DcError> {
        if let Some(Ok(pid)) = self.recorded_pid()? {
            if pid == std::process::id() {
                self.remove_marker()?;
                msg_debug!(Message::MarkerReleased(pid));
            }
        }
        Ok(())
    }

    fn remove_marker(&self) -> Result<(), DcError> {
        match fs::remove_file(&self.marker) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Ownership of the marker; releases it on drop.
#[derive(Debug)]
pub struct InstanceLock {
    guard: InstanceGuard,
    pid: u32,
    released: bool,
}

impl InstanceLock {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn release(mut self) -> Result<(), DcError> {
        self.released = true;
        self.guard.release()
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.guard.release() {
                msg_warning!(Message::MarkerReleaseFailed(e.to_string()));
            }
        }
    }
}

/// Whether `pid` names a running process.
#[cfg(windows)]
pub fn process_alive(pid: u32) -> bool {
    use winapi::shared::minwindef::DWORD;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::minwinbase::STILL_ACTIVE;
    use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
    use winapi::um::winnt::PROCESS_QUERY_LIMITED_INFORMATION;

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        // No handle means no process we can vouch for.
        if handle.is_null() {
            return false;
        }
        let mut code: DWORD = 0;
        let ok = GetExitCodeProcess(handle, &mut code);
        CloseHandle(handle);
        ok != 0 && code == STILL_ACTIVE
    }
}

#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // Signal 0 only checks for existence and permission.
    matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(not(any(unix, windows)))]
pub fn process_alive(_pid: u32) -> bool {
    false
}
