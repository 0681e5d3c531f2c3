//! Overlay scheduler.
//!
//! A small state machine driven by [`OverlayScheduler::step`]:
//!
//! ```text
//!            config ok + enabled                 idle >= timeout
//! Disabled ───────────────────────▶ Idle ─────────────────────────▶ Triggered
//!    ▲  ◀─────────────────────────   │ ▲ ◀─────────────────────────     │
//!    │   config invalid or disabled  │ │      idle < 1 s (input)        │
//!    │                               └─┘                                │
//!    │                          config edited:                          │
//!    │                          restart the wait                        │
//!    └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step returns how long to sleep before the next one: 60 s while
//! disabled, 1 s while waiting and 500 ms while overlays are up.
//!
//! With per-monitor scope a trigger only covers the monitors that were due.
//! The others keep being checked while overlays are up and join the same
//! trigger once they reach the timeout.

use crate::libs::activity::{ActivityAggregator, IdleTimes};
use crate::libs::config::{ConfigStore, IdleScopeMode, SchedulerConfig};
use crate::libs::messages::Message;
use crate::libs::monitors::{MonitorEnumerator, MonitorGeometry};
use crate::libs::overlay::{build_tasks, resolve_targets, OverlayTarget, Renderer};
use crate::libs::sources::InputSources;
use crate::{msg_debug, msg_error, msg_info, msg_warning};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{self, Duration};

pub const DISABLED_POLL: Duration = Duration::from_secs(60);
pub const IDLE_POLL: Duration = Duration::from_secs(1);
pub const TRIGGERED_POLL: Duration = Duration::from_millis(500);

/// Idle below this while overlays are up means the user is back.
pub const DISMISS_BELOW: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Disabled,
    Idle,
    Triggered,
}

struct ActiveOverlay<H> {
    geometry: MonitorGeometry,
    handle: H,
}

enum Phase<H> {
    Disabled,
    Idle {
        config: SchedulerConfig,
        targets: Vec<OverlayTarget>,
    },
    Triggered {
        config: SchedulerConfig,
        targets: Vec<OverlayTarget>,
        overlays: Vec<ActiveOverlay<H>>,
        covered: Vec<MonitorGeometry>,
    },
}

pub struct OverlayScheduler<R: Renderer> {
    aggregator: Arc<ActivityAggregator>,
    store: ConfigStore,
    renderer: R,
    enumerator: Box<dyn MonitorEnumerator>,
    sources: Option<InputSources>,
    phase: Phase<R::Handle>,
}

impl<R: Renderer> OverlayScheduler<R> {
    pub fn new(aggregator: Arc<ActivityAggregator>, store: ConfigStore, renderer: R, enumerator: Box<dyn MonitorEnumerator>) -> Self {
        OverlayScheduler {
            aggregator,
            store,
            renderer,
            enumerator,
            sources: None,
            phase: Phase::Disabled,
        }
    }

    /// Lets the scheduler start and stop input sources as the config changes.
    pub fn with_sources(mut self, sources: InputSources) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn state(&self) -> SchedulerState {
        match self.phase {
            Phase::Disabled => SchedulerState::Disabled,
            Phase::Idle { .. } => SchedulerState::Idle,
            Phase::Triggered { .. } => SchedulerState::Triggered,
        }
    }

    /// Number of overlays currently up.
    pub fn active_overlays(&self) -> usize {
        match &self.phase {
            Phase::Triggered { overlays, .. } => overlays.len(),
            _ => 0,
        }
    }

    /// Monitors covered by the current trigger.
    pub fn covered(&self) -> Vec<MonitorGeometry> {
        match &self.phase {
            Phase::Triggered { covered, .. } => covered.clone(),
            _ => Vec::new(),
        }
    }

    /// Timeout of the wait in progress.
    pub fn timeout(&self) -> Option<Duration> {
        match &self.phase {
            Phase::Idle { config, .. } | Phase::Triggered { config, .. } => Some(config.timeout()),
            Phase::Disabled => None,
        }
    }

    /// Advances the state machine once and returns the delay until the next step.
    pub async fn step(&mut self) -> Duration {
        match std::mem::replace(&mut self.phase, Phase::Disabled) {
            Phase::Disabled => self.begin_wait(true).await,
            Phase::Idle { config, targets } => self.poll_idle(config, targets).await,
            Phase::Triggered {
                config,
                targets,
                overlays,
                covered,
            } => self.poll_triggered(config, targets, overlays, covered).await,
        }
    }

    /// Steps until `shutdown` resolves, then tears everything down.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let delay = self.step().await;
            tokio::select! {
                _ = &mut shutdown => break,
                _ = time::sleep(delay) => {}
            }
        }
        self.shutdown();
    }

    /// Terminates every overlay and stops the input sources.
    pub fn shutdown(&mut self) {
        if let Phase::Triggered { overlays, .. } = std::mem::replace(&mut self.phase, Phase::Disabled) {
            self.terminate_all(overlays);
        }
        if let Some(sources) = self.sources.as_mut() {
            sources.stop_all();
        }
        msg_info!(Message::SchedulerStopped);
    }

    /// Loads the config and starts a new wait, or parks in `Disabled`.
    async fn begin_wait(&mut self, already_disabled: bool) -> Duration {
        match self.load_config(already_disabled).await {
            Some(config) => self.start_wait(config),
            None => {
                self.phase = Phase::Disabled;
                DISABLED_POLL
            }
        }
    }

    /// Re-enumerates monitors, applies the detection settings and waits on `config`.
    fn start_wait(&mut self, config: SchedulerConfig) -> Duration {
        let monitors = self.enumerator.enumerate();
        self.aggregator.set_monitors(&monitors);
        self.aggregator.configure(config.detection);
        if let Some(sources) = self.sources.as_mut() {
            sources.reconcile(&config.detection);
        }

        let targets = resolve_targets(&config, &monitors);
        msg_info!(Message::WaitStarted {
            timeout_secs: config.timeout().as_secs(),
            targets: targets.len(),
        });

        self.evaluate(config, targets)
    }

    async fn poll_idle(&mut self, config: SchedulerConfig, targets: Vec<OverlayTarget>) -> Duration {
        match self.load_config(false).await {
            None => {
                self.phase = Phase::Disabled;
                DISABLED_POLL
            }
            Some(fresh) if fresh != config => {
                msg_info!(Message::ConfigChanged);
                self.start_wait(fresh)
            }
            Some(_) => self.evaluate(config, targets),
        }
    }

    /// Triggers if any target has been idle long enough, otherwise keeps waiting.
    fn evaluate(&mut self, config: SchedulerConfig, targets: Vec<OverlayTarget>) -> Duration {
        let times = self.aggregator.get_idle_times();
        let due = due_targets(&config, &targets, &times);
        if due.is_empty() {
            self.phase = Phase::Idle { config, targets };
            return IDLE_POLL;
        }
        self.trigger(config, targets, due)
    }

    fn trigger(&mut self, config: SchedulerConfig, targets: Vec<OverlayTarget>, due: Vec<OverlayTarget>) -> Duration {
        let overlays = self.launch(&config, &due);
        self.phase = Phase::Triggered {
            config,
            targets,
            overlays,
            covered: due.iter().map(|target| target.geometry).collect(),
        };
        TRIGGERED_POLL
    }

    /// Shows one overlay per due target. Launch failures are logged and skipped.
    fn launch(&self, config: &SchedulerConfig, due: &[OverlayTarget]) -> Vec<ActiveOverlay<R::Handle>> {
        let tasks = build_tasks(config, due, false);
        let mut overlays = Vec::with_capacity(tasks.len());
        for task in &tasks {
            match self.renderer.show(task) {
                Ok(handle) => overlays.push(ActiveOverlay {
                    geometry: task.monitor_geometry,
                    handle,
                }),
                Err(e) => msg_error!(Message::OverlayLaunchFailed(e.to_string())),
            }
        }
        msg_info!(Message::OverlaysTriggered(overlays.len()));
        overlays
    }

    async fn poll_triggered(
        &mut self,
        config: SchedulerConfig,
        targets: Vec<OverlayTarget>,
        mut overlays: Vec<ActiveOverlay<R::Handle>>,
        mut covered: Vec<MonitorGeometry>,
    ) -> Duration {
        let times = self.aggregator.get_idle_times();
        if input_resumed(&config, &covered, &times) {
            let count = overlays.len();
            self.terminate_all(overlays);
            msg_info!(Message::OverlaysDismissed(count));
            return self.begin_wait(false).await;
        }

        // Reap overlays that died on their own; the rest stay up.
        let mut alive = Vec::with_capacity(overlays.len());
        for mut overlay in overlays.drain(..) {
            if self.renderer.is_alive(&mut overlay.handle) {
                alive.push(overlay);
            } else {
                msg_warning!(Message::OverlayExited(overlay.geometry));
                self.renderer.terminate(overlay.handle);
            }
        }

        if config.scope == IdleScopeMode::PerMonitor {
            let pending: Vec<OverlayTarget> = targets.iter().filter(|target| !covered.contains(&target.geometry)).copied().collect();
            let due = due_targets(&config, &pending, &times);
            if !due.is_empty() {
                alive.extend(self.launch(&config, &due));
                covered.extend(due.iter().map(|target| target.geometry));
            }
        }

        self.phase = Phase::Triggered {
            config,
            targets,
            overlays: alive,
            covered,
        };
        TRIGGERED_POLL
    }

    fn terminate_all(&self, overlays: Vec<ActiveOverlay<R::Handle>>) {
        for overlay in overlays {
            self.renderer.terminate(overlay.handle);
        }
    }

    /// The enabled scheduler view of the stored config, if there is one.
    async fn load_config(&self, already_disabled: bool) -> Option<SchedulerConfig> {
        match self.store.load_async(self.enumerator.as_ref()).await {
            Ok(config) if config.enabled => Some(config.scheduler()),
            Ok(_) => {
                if already_disabled {
                    msg_debug!(Message::SchedulerDisabled);
                } else {
                    msg_info!(Message::SchedulerDisabled);
                }
                None
            }
            Err(e) => {
                msg_warning!(Message::ConfigUnusable(e.to_string()));
                None
            }
        }
    }
}

impl<R: Renderer> Drop for OverlayScheduler<R> {
    fn drop(&mut self) {
        if let Phase::Triggered { overlays, .. } = std::mem::replace(&mut self.phase, Phase::Disabled) {
            self.terminate_all(overlays);
        }
    }
}

/// Idle duration that counts for `geometry`; untracked monitors follow the system.
fn monitor_idle(times: &IdleTimes, geometry: &MonitorGeometry) -> Duration {
    times.monitor(geometry).unwrap_or(times.system)
}

fn due_targets(config: &SchedulerConfig, targets: &[OverlayTarget], times: &IdleTimes) -> Vec<OverlayTarget> {
    let timeout = config.timeout();
    match config.scope {
        IdleScopeMode::System if times.system >= timeout => targets.to_vec(),
        IdleScopeMode::System => Vec::new(),
        IdleScopeMode::PerMonitor => targets
            .iter()
            .filter(|target| monitor_idle(times, &target.geometry) >= timeout)
            .copied()
            .collect(),
    }
}

fn input_resumed(config: &SchedulerConfig, covered: &[MonitorGeometry], times: &IdleTimes) -> bool {
    match config.scope {
        IdleScopeMode::System => times.system < DISMISS_BELOW,
        IdleScopeMode::PerMonitor => covered.iter().any(|geometry| monitor_idle(times, geometry) < DISMISS_BELOW),
    }
}
