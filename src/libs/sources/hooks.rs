//! Global keyboard and mouse hooks.
//!
//! Events are translated into the platform-neutral [`InputEvent`] and passed
//! through a [`HookDispatcher`], which debounces mouse moves and attributes
//! mouse activity to the cursor position before marking input.

use super::InputSource;
use crate::libs::activity::ActivityAggregator;
use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::msg_debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum interval between two activity log lines of the same kind.
const LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Key,
    MouseMove { x: i32, y: i32 },
    MouseButton,
    Wheel,
}

/// Drops mouse moves that stay within one pixel of the last accepted position.
#[derive(Debug, Default, Clone)]
pub struct MouseFilter {
    last_accepted: Option<(i32, i32)>,
}

impl MouseFilter {
    pub const MIN_DISPLACEMENT: i32 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and remembers the position if it moved far enough.
    pub fn accept(&mut self, x: i32, y: i32) -> bool {
        let moved = match self.last_accepted {
            None => true,
            Some((last_x, last_y)) => {
                (x - last_x).abs() >= Self::MIN_DISPLACEMENT || (y - last_y).abs() >= Self::MIN_DISPLACEMENT
            }
        };
        if moved {
            self.last_accepted = Some((x, y));
        }
        moved
    }
}

/// Turns hook events into aggregator input.
pub struct HookDispatcher {
    aggregator: Arc<ActivityAggregator>,
    filter: MouseFilter,
    cursor: Option<(i32, i32)>,
    last_key_log: Option<Instant>,
    last_mouse_log: Option<Instant>,
}

impl HookDispatcher {
    pub fn new(aggregator: Arc<ActivityAggregator>) -> Self {
        HookDispatcher {
            aggregator,
            filter: MouseFilter::new(),
            cursor: None,
            last_key_log: None,
            last_mouse_log: None,
        }
    }

    /// Handles one event; returns whether it counted as input.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Key => {
                self.aggregator.mark_input(None);
                if due(&mut self.last_key_log) {
                    msg_debug!(Message::KeyboardActivity);
                }
                true
            }
            InputEvent::MouseMove { x, y } => {
                self.cursor = Some((x, y));
                if !self.filter.accept(x, y) {
                    return false;
                }
                self.aggregator.mark_input(Some((x, y)));
                if due(&mut self.last_mouse_log) {
                    msg_debug!(Message::MouseActivity(x, y));
                }
                true
            }
            // Clicks and wheel carry no position of their own.
            InputEvent::MouseButton | InputEvent::Wheel => {
                self.aggregator.mark_input(self.cursor);
                true
            }
        }
    }
}

fn due(last: &mut Option<Instant>) -> bool {
    let now = Instant::now();
    match last {
        Some(at) if now.duration_since(*at) < LOG_INTERVAL => false,
        _ => {
            *last = Some(now);
            true
        }
    }
}

/// Keyboard and mouse hook source.
///
/// The OS listener cannot be unregistered once installed, so it is spawned at
/// most once and `stop` only makes it ignore events.
pub struct HookSource {
    aggregator: Arc<ActivityAggregator>,
    running: Arc<AtomicBool>,
    listener_spawned: bool,
}

impl HookSource {
    pub fn new(aggregator: Arc<ActivityAggregator>) -> Self {
        HookSource {
            aggregator,
            running: Arc::new(AtomicBool::new(false)),
            listener_spawned: false,
        }
    }
}

impl InputSource for HookSource {
    fn name(&self) -> &'static str {
        "keyboard/mouse hook"
    }

    fn start(&mut self) -> Result<(), DcError> {
        if !self.listener_spawned {
            spawn_listener(self.aggregator.clone(), self.running.clone())?;
            self.listener_spawned = true;
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(windows)]
fn spawn_listener(aggregator: Arc<ActivityAggregator>, running: Arc<AtomicBool>) -> Result<(), DcError> {
    use crate::msg_warning;
    use parking_lot::Mutex;
    use rdev::{listen, Event, EventType};

    let dispatcher = Arc::new(Mutex::new(HookDispatcher::new(aggregator)));

    std::thread::Builder::new()
        .name("dcplus-hooks".to_string())
        .spawn(move || loop {
            let dispatcher = dispatcher.clone();
            let running = running.clone();
            let result = listen(move |event: Event| {
                if !running.load(Ordering::Relaxed) {
                    return;
                }
                let translated = match event.event_type {
                    EventType::KeyPress(_) | EventType::KeyRelease(_) => InputEvent::Key,
                    EventType::ButtonPress(_) | EventType::ButtonRelease(_) => InputEvent::MouseButton,
                    EventType::Wheel { .. } => InputEvent::Wheel,
                    EventType::MouseMove { x, y } => InputEvent::MouseMove {
                        x: x.round() as i32,
                        y: y.round() as i32,
                    },
                };
                dispatcher.lock().handle(translated);
            });
            match result {
                Ok(()) => break,
                Err(e) => {
                    msg_warning!(Message::HookListenFailed(format!("{:?}", e)));
                    std::thread::sleep(Duration::from_secs(1));
                }
            }
        })
        .map(|_| ())
        .map_err(|e| DcError::source_unavailable("keyboard/mouse hook", e.to_string()))
}

#[cfg(not(windows))]
fn spawn_listener(_aggregator: Arc<ActivityAggregator>, _running: Arc<AtomicBool>) -> Result<(), DcError> {
    Err(DcError::source_unavailable(
        "keyboard/mouse hook",
        "global input hooks are only available on Windows",
    ))
}
