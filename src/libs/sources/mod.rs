//! Input signal sources.
//!
//! Every source runs on its own thread and reports to the shared
//! [`ActivityAggregator`](crate::libs::activity::ActivityAggregator). Sources
//! are best effort: one that fails to start is logged and skipped, and the
//! others keep running.

pub mod gamepad;
pub mod hooks;
pub mod idle_gauge;
pub mod raw_input;

use crate::libs::activity::ActivityAggregator;
use crate::libs::config::DetectionConfig;
use crate::libs::error::DcError;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_warning};
use gamepad::GamepadPoller;
use hooks::HookSource;
use raw_input::RawInputSource;
use std::sync::Arc;

/// A startable, stoppable producer of input events.
///
/// `stop` only flags the source; its thread notices on its next cadence tick.
pub trait InputSource: Send {
    fn name(&self) -> &'static str;
    fn start(&mut self) -> Result<(), DcError>;
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// The set of sources the background process runs.
pub struct InputSources {
    hooks: Box<dyn InputSource>,
    gamepad: Box<dyn InputSource>,
    raw_input: Box<dyn InputSource>,
}

impl InputSources {
    pub fn new(aggregator: Arc<ActivityAggregator>) -> Self {
        Self::from_parts(
            Box::new(HookSource::new(aggregator.clone())),
            Box::new(GamepadPoller::new(aggregator.clone())),
            Box::new(RawInputSource::new(aggregator)),
        )
    }

    pub fn from_parts(hooks: Box<dyn InputSource>, gamepad: Box<dyn InputSource>, raw_input: Box<dyn InputSource>) -> Self {
        InputSources { hooks, gamepad, raw_input }
    }

    /// Starts or stops each source to match the detection settings.
    ///
    /// Hooks always run. The gamepad poller follows `controller_enabled`, the
    /// raw-input window follows `controller_use_raw_input`.
    pub fn reconcile(&mut self, detection: &DetectionConfig) {
        set_running(self.hooks.as_mut(), true);
        set_running(self.gamepad.as_mut(), detection.controller_enabled);
        set_running(self.raw_input.as_mut(), detection.controller_use_raw_input);
    }

    pub fn stop_all(&mut self) {
        for source in [&mut self.hooks, &mut self.gamepad, &mut self.raw_input] {
            set_running(source.as_mut(), false);
        }
    }

    /// Names of the sources currently running.
    pub fn running(&self) -> Vec<&'static str> {
        [&self.hooks, &self.gamepad, &self.raw_input]
            .into_iter()
            .filter(|source| source.is_running())
            .map(|source| source.name())
            .collect()
    }
}

fn set_running(source: &mut dyn InputSource, wanted: bool) {
    match (wanted, source.is_running()) {
        (true, false) => match source.start() {
            Ok(()) => msg_debug!(Message::SourceStarted(source.name())),
            Err(e) => msg_warning!(Message::SourceUnavailable(e.to_string())),
        },
        (false, true) => {
            source.stop();
            msg_debug!(Message::SourceStopped(source.name()));
        }
        _ => {}
    }
}
