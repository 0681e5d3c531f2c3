//! Monitor topology queries.
//!
//! Monitors are identified by their pixel rectangle. A geometry is compared by
//! value and never mutated once enumerated, which makes it usable both as the
//! per-monitor idle tracking key and as the descriptor handed to a renderer.
//!
//! Enumeration is fail-soft: `EnumDisplayMonitors` is tried first, then the
//! display-device/display-settings pair, and if both fail the result is an empty
//! list. "No monitors" is a valid state that simply leaves nothing to protect.

use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_warning};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer pixel rectangle `[left, top, right, bottom)` of one physical display.
///
/// Serialised as a four-element array, matching the `monitors` entries written
/// by the settings GUI.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct MonitorGeometry {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl MonitorGeometry {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// A rectangle with no area cannot host an overlay.
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Half-open point-in-rect test; the right and bottom edges belong to the neighbour.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

impl From<[i32; 4]> for MonitorGeometry {
    fn from([left, top, right, bottom]: [i32; 4]) -> Self {
        Self::new(left, top, right, bottom)
    }
}

impl From<MonitorGeometry> for [i32; 4] {
    fn from(geometry: MonitorGeometry) -> Self {
        [geometry.left, geometry.top, geometry.right, geometry.bottom]
    }
}

impl fmt::Display for MonitorGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.left, self.top, self.right, self.bottom)
    }
}

/// Returns the first monitor whose rectangle contains the point.
pub fn select_monitor_for_point(monitors: &[MonitorGeometry], point: (i32, i32)) -> Option<&MonitorGeometry> {
    monitors.iter().find(|geometry| geometry.contains(point.0, point.1))
}

/// Source of the current monitor list.
///
/// The scheduler re-runs this whenever it starts a new wait, so implementations
/// must be cheap and side-effect free.
pub trait MonitorEnumerator: Send + Sync {
    fn enumerate(&self) -> Vec<MonitorGeometry>;
}

/// Queries the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMonitors;

impl MonitorEnumerator for SystemMonitors {
    fn enumerate(&self) -> Vec<MonitorGeometry> {
        enumerate()
    }
}

/// A fixed topology, used when the layout is already known.
impl MonitorEnumerator for Vec<MonitorGeometry> {
    fn enumerate(&self) -> Vec<MonitorGeometry> {
        self.clone()
    }
}

/// Enumerates the attached monitors in OS order.
pub fn enumerate() -> Vec<MonitorGeometry> {
    let monitors = match enumerate_primary() {
        Ok(monitors) if !monitors.is_empty() => monitors,
        Ok(_) => {
            msg_warning!(Message::MonitorEnumerationFallback("no monitors reported".to_string()));
            enumerate_secondary_or_empty()
        }
        Err(e) => {
            msg_warning!(Message::MonitorEnumerationFallback(e.to_string()));
            enumerate_secondary_or_empty()
        }
    };

    for (index, geometry) in monitors.iter().enumerate() {
        msg_debug!(Message::MonitorDetected(index, *geometry));
    }
    if monitors.is_empty() {
        msg_warning!(Message::NoMonitorsDetected);
    }
    monitors
}

fn enumerate_secondary_or_empty() -> Vec<MonitorGeometry> {
    match enumerate_secondary() {
        Ok(monitors) => monitors,
        Err(e) => {
            msg_warning!(Message::MonitorEnumerationFailed(e.to_string()));
            Vec::new()
        }
    }
}

#[cfg(windows)]
fn enumerate_primary() -> Result<Vec<MonitorGeometry>, DcError> {
    use std::mem;
    use winapi::shared::minwindef::{BOOL, LPARAM, TRUE};
    use winapi::shared::windef::{HDC, HMONITOR, LPRECT};
    use winapi::um::winuser::{EnumDisplayMonitors, GetMonitorInfoW, MONITORINFO};

    unsafe extern "system" fn monitor_enum_proc(monitor: HMONITOR, _hdc: HDC, _clip: LPRECT, data: LPARAM) -> BOOL {
        let monitors = &mut *(data as *mut Vec<MonitorGeometry>);
        let mut info: MONITORINFO = mem::zeroed();
        info.cbSize = mem::size_of::<MONITORINFO>() as u32;
        if GetMonitorInfoW(monitor, &mut info) != 0 {
            let rc = info.rcMonitor;
            monitors.push(MonitorGeometry::new(rc.left, rc.top, rc.right, rc.bottom));
        }
        TRUE
    }

    let mut monitors: Vec<MonitorGeometry> = Vec::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            std::ptr::null_mut(),
            std::ptr::null(),
            Some(monitor_enum_proc),
            &mut monitors as *mut Vec<MonitorGeometry> as LPARAM,
        )
    };
    if ok == 0 {
        let code = unsafe { winapi::um::errhandlingapi::GetLastError() };
        return Err(DcError::EnumerationFailure(format!("EnumDisplayMonitors failed with error {}", code)));
    }
    Ok(monitors)
}

/// Walks the display adapters attached to the desktop and reads each one's
/// current mode for position and resolution.
#[cfg(windows)]
fn enumerate_secondary() -> Result<Vec<MonitorGeometry>, DcError> {
    use std::mem;
    use winapi::um::wingdi::{DEVMODEW, DISPLAY_DEVICEW, DISPLAY_DEVICE_ATTACHED_TO_DESKTOP};
    use winapi::um::winuser::{EnumDisplayDevicesW, EnumDisplaySettingsW, ENUM_CURRENT_SETTINGS};

    let mut monitors = Vec::new();
    let mut device_index = 0;
    loop {
        let mut device: DISPLAY_DEVICEW = unsafe { mem::zeroed() };
        device.cb = mem::size_of::<DISPLAY_DEVICEW>() as u32;
        if unsafe { EnumDisplayDevicesW(std::ptr::null(), device_index, &mut device, 0) } == 0 {
            break;
        }
        device_index += 1;
        if device.StateFlags & DISPLAY_DEVICE_ATTACHED_TO_DESKTOP == 0 {
            continue;
        }

        let mut mode: DEVMODEW = unsafe { mem::zeroed() };
        mode.dmSize = mem::size_of::<DEVMODEW>() as u16;
        if unsafe { EnumDisplaySettingsW(device.DeviceName.as_ptr(), ENUM_CURRENT_SETTINGS, &mut mode) } == 0 {
            continue;
        }
        let position = unsafe { mode.u1.s2().dmPosition };
        let width = mode.dmPelsWidth as i32;
        let height = mode.dmPelsHeight as i32;
        monitors.push(MonitorGeometry::new(position.x, position.y, position.x + width, position.y + height));
    }

    if monitors.is_empty() {
        return Err(DcError::EnumerationFailure("no display device attached to the desktop".to_string()));
    }
    Ok(monitors)
}

#[cfg(not(windows))]
fn enumerate_primary() -> Result<Vec<MonitorGeometry>, DcError> {
    Err(DcError::EnumerationFailure("monitor enumeration is only implemented on Windows".to_string()))
}

#[cfg(not(windows))]
fn enumerate_secondary() -> Result<Vec<MonitorGeometry>, DcError> {
    Err(DcError::EnumerationFailure("no secondary enumeration mechanism on this platform".to_string()))
}
