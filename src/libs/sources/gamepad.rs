//! XInput controller polling.
//!
//! Each of the four controller slots is read every 100 ms. A slot only counts
//! as active when its packet number changed *and* the new state shows real
//! movement: a pressed button, a trigger past the threshold or a stick past the
//! deadzone. Worn sticks change the packet number on their own, and that drift
//! must not keep the display awake.

use super::InputSource;
use crate::libs::activity::ActivityAggregator;
use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::msg_debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SLOT_COUNT: u32 = 4;
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One controller state reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PadSample {
    pub packet: u32,
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl PadSample {
    /// Whether this state reflects a deliberate input.
    pub fn moved(&self, stick_deadzone: i32, trigger_threshold: i32) -> bool {
        let deadzone = stick_deadzone.max(0);
        let threshold = trigger_threshold.max(0);

        let stick = [self.thumb_lx, self.thumb_ly, self.thumb_rx, self.thumb_ry]
            .iter()
            .any(|axis| i32::from(*axis).abs() > deadzone);
        let trigger = i32::from(self.left_trigger) > threshold || i32::from(self.right_trigger) > threshold;

        self.buttons != 0 || trigger || stick
    }
}

/// Last packet number seen per slot.
#[derive(Debug, Default, Clone)]
pub struct PacketTracker {
    last: [u32; SLOT_COUNT as usize],
}

impl PacketTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reading and reports whether it is fresh activity.
    pub fn observe(&mut self, slot: u32, sample: &PadSample, stick_deadzone: i32, trigger_threshold: i32) -> bool {
        let Some(last) = self.last.get_mut(slot as usize) else {
            return false;
        };
        if *last == sample.packet {
            return false;
        }
        *last = sample.packet;
        sample.moved(stick_deadzone, trigger_threshold)
    }

    /// Forgets a slot whose controller went away.
    pub fn forget(&mut self, slot: u32) {
        if let Some(last) = self.last.get_mut(slot as usize) {
            *last = 0;
        }
    }
}

/// Reads controller state.
pub trait GamepadBackend: Send {
    /// `None` when no controller is connected in `slot`.
    fn read(&self, slot: u32) -> Option<PadSample>;
}

/// Polls every slot once and marks input if any of them moved.
///
/// Thresholds come from the aggregator's current detection settings, so
/// config edits apply on the next poll.
pub fn poll_once(backend: &dyn GamepadBackend, tracker: &mut PacketTracker, aggregator: &ActivityAggregator) -> bool {
    let detection = aggregator.detection();
    let mut active = false;

    for slot in 0..SLOT_COUNT {
        match backend.read(slot) {
            Some(sample) => {
                if tracker.observe(slot, &sample, detection.stick_deadzone, detection.trigger_threshold) {
                    active = true;
                }
            }
            None => tracker.forget(slot),
        }
    }

    if active {
        aggregator.mark_input(None);
    }
    active
}

pub type BackendFactory = fn() -> Result<Box<dyn GamepadBackend>, DcError>;

/// Background thread driving [`poll_once`].
pub struct GamepadPoller {
    aggregator: Arc<ActivityAggregator>,
    factory: BackendFactory,
    running: Arc<AtomicBool>,
}

impl GamepadPoller {
    pub fn new(aggregator: Arc<ActivityAggregator>) -> Self {
        Self::with_backend(aggregator, XInputBackend::boxed)
    }

    pub fn with_backend(aggregator: Arc<ActivityAggregator>, factory: BackendFactory) -> Self {
        GamepadPoller {
            aggregator,
            factory,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InputSource for GamepadPoller {
    fn name(&self) -> &'static str {
        "gamepad"
    }

    fn start(&mut self) -> Result<(), DcError> {
        if self.is_running() {
            return Ok(());
        }
        let backend = (self.factory)()?;

        // A fresh flag per run so a thread from an earlier run cannot be revived.
        let running = Arc::new(AtomicBool::new(true));
        self.running = running.clone();
        let aggregator = self.aggregator.clone();

        std::thread::Builder::new()
            .name("dcplus-gamepad".to_string())
            .spawn(move || {
                let mut tracker = PacketTracker::new();
                while running.load(Ordering::Relaxed) {
                    if poll_once(backend.as_ref(), &mut tracker, &aggregator) {
                        msg_debug!(Message::GamepadActivity);
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                DcError::source_unavailable("gamepad", e.to_string())
            })?;
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// XInput loaded from whichever system DLL is present.
#[cfg(windows)]
pub struct XInputBackend {
    _library: libloading::Library,
    get_state: XInputGetStateFn,
}

#[cfg(windows)]
type XInputGetStateFn = unsafe extern "system" fn(u32, *mut winapi::um::xinput::XINPUT_STATE) -> u32;

#[cfg(windows)]
const XINPUT_DLLS: [&str; 3] = ["xinput1_4.dll", "xinput1_3.dll", "xinput9_1_0.dll"];

#[cfg(windows)]
impl XInputBackend {
    pub fn load() -> Result<Self, DcError> {
        let mut last_error = String::from("no XInput library found");
        for name in XINPUT_DLLS {
            let library = match unsafe { libloading::Library::new(name) } {
                Ok(library) => library,
                Err(e) => {
                    last_error = format!("{}: {}", name, e);
                    continue;
                }
            };
            let get_state = match unsafe { library.get::<XInputGetStateFn>(b"XInputGetState\0") } {
                Ok(symbol) => *symbol,
                Err(e) => {
                    last_error = format!("{}: {}", name, e);
                    continue;
                }
            };
            msg_debug!(Message::GamepadBackendLoaded(name.to_string()));
            return Ok(XInputBackend {
                _library: library,
                get_state,
            });
        }
        Err(DcError::source_unavailable("gamepad", last_error))
    }
}

#[cfg(windows)]
impl GamepadBackend for XInputBackend {
    fn read(&self, slot: u32) -> Option<PadSample> {
        use winapi::shared::winerror::ERROR_SUCCESS;
        use winapi::um::xinput::XINPUT_STATE;

        let mut state: XINPUT_STATE = unsafe { std::mem::zeroed() };
        if unsafe { (self.get_state)(slot, &mut state) } != ERROR_SUCCESS {
            return None;
        }
        let pad = state.Gamepad;
        Some(PadSample {
            packet: state.dwPacketNumber,
            buttons: pad.wButtons,
            left_trigger: pad.bLeftTrigger,
            right_trigger: pad.bRightTrigger,
            thumb_lx: pad.sThumbLX,
            thumb_ly: pad.sThumbLY,
            thumb_rx: pad.sThumbRX,
            thumb_ry: pad.sThumbRY,
        })
    }
}

#[cfg(not(windows))]
pub struct XInputBackend;

#[cfg(not(windows))]
impl XInputBackend {
    pub fn load() -> Result<Self, DcError> {
        Err(DcError::source_unavailable("gamepad", "XInput is only available on Windows"))
    }
}

#[cfg(not(windows))]
impl GamepadBackend for XInputBackend {
    fn read(&self, _slot: u32) -> Option<PadSample> {
        None
    }
}

impl XInputBackend {
    fn boxed() -> Result<Box<dyn GamepadBackend>, DcError> {
        Ok(Box::new(Self::load()?))
    }
}
