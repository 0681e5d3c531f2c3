//! Raw HID input backstop.
//!
//! A hidden message-only window subscribes to generic-desktop gamepad, joystick
//! and keyboard usages with `RIDEV_INPUTSINK`, so it receives input even in the
//! background. Any `WM_INPUT` counts as activity. This is coarse (it has no
//! notion of stick deadzones) and only runs when the user enables it.

use super::InputSource;
use crate::libs::activity::ActivityAggregator;
use crate::libs::error::DcError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
#[cfg(windows)]
use std::time::Duration;

#[cfg(windows)]
const PUMP_INTERVAL: Duration = Duration::from_millis(50);
#[cfg(windows)]
const INIT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RawInputSource {
    aggregator: Arc<ActivityAggregator>,
    running: Arc<AtomicBool>,
}

impl RawInputSource {
    pub fn new(aggregator: Arc<ActivityAggregator>) -> Self {
        RawInputSource {
            aggregator,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InputSource for RawInputSource {
    fn name(&self) -> &'static str {
        "raw input"
    }

    fn start(&mut self) -> Result<(), DcError> {
        if self.is_running() {
            return Ok(());
        }
        let running = Arc::new(AtomicBool::new(true));
        self.running = running.clone();
        spawn_sink(self.aggregator.clone(), running).inspect_err(|_| self.running.store(false, Ordering::SeqCst))
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(windows)]
fn spawn_sink(aggregator: Arc<ActivityAggregator>, running: Arc<AtomicBool>) -> Result<(), DcError> {
    use std::sync::mpsc;

    let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

    std::thread::Builder::new()
        .name("dcplus-rawinput".to_string())
        .spawn(move || {
            let hwnd = match unsafe { win::create_sink_window() } {
                Ok(hwnd) => {
                    let _ = ready_tx.send(Ok(()));
                    hwnd
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            while running.load(Ordering::Relaxed) {
                if unsafe { win::drain_messages(hwnd) } {
                    aggregator.mark_input(None);
                }
                std::thread::sleep(PUMP_INTERVAL);
            }
            unsafe { win::destroy(hwnd) };
        })
        .map_err(|e| DcError::source_unavailable("raw input", e.to_string()))?;

    match ready_rx.recv_timeout(INIT_TIMEOUT) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(reason)) => Err(DcError::source_unavailable("raw input", reason)),
        Err(_) => Err(DcError::source_unavailable("raw input", "message window did not initialise in time")),
    }
}

#[cfg(windows)]
mod win {
    use std::mem;
    use std::ptr;
    use winapi::shared::minwindef::UINT;
    use winapi::shared::windef::HWND;
    use winapi::shared::winerror::ERROR_CLASS_ALREADY_EXISTS;
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::libloaderapi::GetModuleHandleW;
    use winapi::um::winuser::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, PeekMessageW, RegisterClassW,
        RegisterRawInputDevices, TranslateMessage, HWND_MESSAGE, MSG, PM_REMOVE, RAWINPUTDEVICE, RIDEV_INPUTSINK,
        WM_INPUT, WNDCLASSW,
    };

    const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;
    const USAGE_GAMEPAD: u16 = 0x05;
    const USAGE_JOYSTICK: u16 = 0x04;
    const USAGE_KEYBOARD: u16 = 0x06;

    fn wide(text: &str) -> Vec<u16> {
        text.encode_utf16().chain(std::iter::once(0)).collect()
    }

    pub unsafe fn create_sink_window() -> Result<HWND, String> {
        let instance = GetModuleHandleW(ptr::null());
        let class_name = wide("DcplusRawInputSink");

        let mut class: WNDCLASSW = mem::zeroed();
        class.lpfnWndProc = Some(DefWindowProcW);
        class.hInstance = instance;
        class.lpszClassName = class_name.as_ptr();
        if RegisterClassW(&class) == 0 && GetLastError() != ERROR_CLASS_ALREADY_EXISTS {
            return Err(format!("RegisterClassW failed with error {}", GetLastError()));
        }

        let hwnd = CreateWindowExW(
            0,
            class_name.as_ptr(),
            class_name.as_ptr(),
            0,
            0,
            0,
            0,
            0,
            HWND_MESSAGE,
            ptr::null_mut(),
            instance,
            ptr::null_mut(),
        );
        if hwnd.is_null() {
            return Err(format!("CreateWindowExW failed with error {}", GetLastError()));
        }

        let devices = [USAGE_GAMEPAD, USAGE_JOYSTICK, USAGE_KEYBOARD].map(|usage| RAWINPUTDEVICE {
            usUsagePage: USAGE_PAGE_GENERIC_DESKTOP,
            usUsage: usage,
            dwFlags: RIDEV_INPUTSINK,
            hwndTarget: hwnd,
        });
        if RegisterRawInputDevices(devices.as_ptr(), devices.len() as UINT, mem::size_of::<RAWINPUTDEVICE>() as UINT) == 0 {
            let code = GetLastError();
            DestroyWindow(hwnd);
            return Err(format!("RegisterRawInputDevices failed with error {}", code));
        }
        Ok(hwnd)
    }

    /// Empties the window's queue; returns whether any raw input arrived.
    pub unsafe fn drain_messages(hwnd: HWND) -> bool {
        let mut received = false;
        let mut msg: MSG = mem::zeroed();
        while PeekMessageW(&mut msg, hwnd, 0, 0, PM_REMOVE) != 0 {
            if msg.message == WM_INPUT {
                received = true;
            }
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        received
    }

    pub unsafe fn destroy(hwnd: HWND) {
        DestroyWindow(hwnd);
    }
}

#[cfg(not(windows))]
fn spawn_sink(_aggregator: Arc<ActivityAggregator>, _running: Arc<AtomicBool>) -> Result<(), DcError> {
    Err(DcError::source_unavailable("raw input", "raw input is only available on Windows"))
}
