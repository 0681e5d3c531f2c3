//! Activity aggregation.
//!
//! Every input source funnels into one [`ActivityAggregator`]. It keeps the
//! timestamps of the last accepted input system-wide and per monitor, and turns
//! them into idle durations on request, cross-checked against the OS idle gauge.
//!
//! All state sits behind a single lock. Hook callbacks, the gamepad poller, the
//! 1 Hz ticker and the scheduler only ever hold it long enough to update a
//! timestamp or copy a snapshot out.

use crate::libs::config::{DetectionConfig, DetectionMode, IdleScopeMode};
use crate::libs::messages::Message;
use crate::libs::monitors::{select_monitor_for_point, MonitorGeometry};
use crate::libs::sources::idle_gauge::IdleGauge;
use crate::msg_debug;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

/// Ticks between two idle summaries in the log.
const SUMMARY_EVERY_TICKS: u64 = 30;

/// Key of one idle measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdleScope {
    System,
    Monitor(MonitorGeometry),
}

/// Point-in-time copy of the idle state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdleTimes {
    pub system: Duration,
    pub monitors: Vec<(MonitorGeometry, Duration)>,
}

impl IdleTimes {
    pub fn system(&self) -> Duration {
        self.system
    }

    pub fn monitor(&self, geometry: &MonitorGeometry) -> Option<Duration> {
        self.monitors.iter().find(|(g, _)| g == geometry).map(|(_, idle)| *idle)
    }

    pub fn get(&self, scope: IdleScope) -> Option<Duration> {
        match scope {
            IdleScope::System => Some(self.system),
            IdleScope::Monitor(geometry) => self.monitor(&geometry),
        }
    }
}

#[derive(Debug)]
struct MonitorTrack {
    geometry: MonitorGeometry,
    last_input: Instant,
}

#[derive(Debug)]
struct GaugeSample {
    idle: Duration,
    taken_at: Instant,
}

#[derive(Debug)]
struct IdleState {
    detection: DetectionConfig,
    last_input: Instant,
    last_activity: Instant,
    gauge: Option<GaugeSample>,
    monitors: Vec<MonitorTrack>,
    ticks: u64,
}

impl IdleState {
    fn snapshot(&self, now: Instant) -> IdleTimes {
        let hook_idle = now.saturating_duration_since(self.last_input);
        let activity_idle = now.saturating_duration_since(self.last_activity);

        // The gauge sample ages with the clock between ticks.
        let gauge_idle = self.gauge.as_ref().map(|sample| sample.idle + now.saturating_duration_since(sample.taken_at));
        let input_idle = match gauge_idle {
            Some(gauge_idle) => hook_idle.min(gauge_idle),
            None => hook_idle,
        };

        let system = match self.detection.mode {
            DetectionMode::Input => input_idle,
            DetectionMode::Activity => activity_idle,
            DetectionMode::Both => input_idle.min(activity_idle),
        };

        // Input the gauge saw but the hooks did not has no position, so it
        // counts for every monitor.
        let unplaced = match gauge_idle {
            Some(gauge_idle) if self.detection.mode != DetectionMode::Activity && gauge_idle < hook_idle => Some(gauge_idle),
            _ => None,
        };
        let monitors = self
            .monitors
            .iter()
            .map(|track| {
                let idle = now.saturating_duration_since(track.last_input);
                (track.geometry, unplaced.map_or(idle, |gauge_idle| idle.min(gauge_idle)))
            })
            .collect();

        IdleTimes { system, monitors }
    }
}

/// Shared idle-time state fed by every input source.
pub struct ActivityAggregator {
    gauge: Arc<dyn IdleGauge>,
    state: Mutex<IdleState>,
}

impl ActivityAggregator {
    pub fn new(gauge: Arc<dyn IdleGauge>, detection: DetectionConfig) -> Self {
        let now = Instant::now();
        ActivityAggregator {
            gauge,
            state: Mutex::new(IdleState {
                detection,
                last_input: now,
                last_activity: now,
                gauge: None,
                monitors: Vec::new(),
                ticks: 0,
            }),
        }
    }

    /// Records one accepted input event.
    ///
    /// The system idle always resets. With per-monitor scope and a known
    /// position only the monitor under the point resets; otherwise every
    /// tracked monitor does.
    pub fn mark_input(&self, position: Option<(i32, i32)>) {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.last_input = now;
        state.last_activity = now;
        // Fresh input supersedes whatever the gauge last said.
        state.gauge = None;

        match (state.detection.scope, position) {
            (IdleScopeMode::PerMonitor, Some(point)) => {
                let geometries: Vec<MonitorGeometry> = state.monitors.iter().map(|track| track.geometry).collect();
                if let Some(hit) = select_monitor_for_point(&geometries, point).copied() {
                    if let Some(track) = state.monitors.iter_mut().find(|track| track.geometry == hit) {
                        track.last_input = now;
                    }
                }
            }
            _ => {
                for track in state.monitors.iter_mut() {
                    track.last_input = now;
                }
            }
        }
    }

    /// Samples the OS gauge and logs a periodic summary.
    pub fn tick(&self) {
        // The gauge is an OS call; keep it outside the lock.
        let gauge_idle = self.gauge.idle();
        let now = Instant::now();

        let mut state = self.state.lock();
        state.gauge = gauge_idle.map(|idle| GaugeSample { idle, taken_at: now });
        state.ticks = state.ticks.wrapping_add(1);

        if state.ticks % SUMMARY_EVERY_TICKS == 0 {
            let times = state.snapshot(now);
            drop(state);
            msg_debug!(Message::IdleSummary {
                system_secs: times.system.as_secs(),
                monitors: times.monitors.len(),
            });
        }
    }

    /// Idle durations as of now.
    pub fn get_idle_times(&self) -> IdleTimes {
        let now = Instant::now();
        self.state.lock().snapshot(now)
    }

    /// Swaps in new detection settings in one step.
    pub fn configure(&self, detection: DetectionConfig) {
        let mut state = self.state.lock();
        if state.detection != detection {
            state.detection = detection;
            drop(state);
            msg_debug!(Message::DetectionConfigured(format!("{:?}", detection)));
        }
    }

    pub fn detection(&self) -> DetectionConfig {
        self.state.lock().detection
    }

    /// Aligns the tracked monitors with a fresh enumeration.
    ///
    /// Geometries that disappeared are dropped. New ones start from the system
    /// last-input time, so a newly attached monitor is not instantly idle.
    pub fn set_monitors(&self, monitors: &[MonitorGeometry]) {
        let mut state = self.state.lock();
        let since = state.last_input;
        state.monitors.retain(|track| monitors.contains(&track.geometry));
        for geometry in monitors {
            if !state.monitors.iter().any(|track| track.geometry == *geometry) {
                state.monitors.push(MonitorTrack {
                    geometry: *geometry,
                    last_input: since,
                });
            }
        }
    }

    /// Geometries currently tracked, in insertion order.
    pub fn monitors(&self) -> Vec<MonitorGeometry> {
        self.state.lock().monitors.iter().map(|track| track.geometry).collect()
    }

    /// Runs [`tick`](Self::tick) on a fixed cadence until the task is aborted.
    pub fn start_ticker(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick();
            }
        })
    }
}
