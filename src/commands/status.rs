use crate::libs::config::{Config, ConfigStore, DetectionMode, IdleScopeMode};
use crate::libs::instance::InstanceGuard;
use crate::libs::messages::Message;
use crate::libs::monitors;
use crate::libs::overlay::{resolve_targets, ProcessRenderer};
use crate::{msg_print, msg_warning};
use anyhow::Result;
use chrono::Local;

/// Prints the configuration path, background process state, effective
/// timeout and the monitors that would be covered.
pub fn cmd() -> Result<()> {
    msg_print!(Message::StatusHeader(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()));

    let store = ConfigStore::new()?;
    msg_print!(Message::StatusConfigPath(store.path().display().to_string()));

    match InstanceGuard::new()?.running_pid()? {
        Some(pid) => msg_print!(Message::StatusRunning(pid)),
        None => msg_print!(Message::StatusNotRunning),
    }

    let detected = monitors::enumerate();
    let config = match store.read() {
        Ok(config) => config.unwrap_or_else(|| Config::with_monitors(&detected)),
        Err(e) => {
            msg_warning!(Message::ConfigUnusable(e.to_string()));
            return Ok(());
        }
    };
    let scheduler = config.scheduler();

    if scheduler.enabled {
        msg_print!(Message::StatusTimeout {
            seconds: scheduler.timeout().as_secs(),
            scope: scope_name(scheduler.scope).to_string(),
            detection: detection_name(scheduler.detection_mode).to_string(),
        });
    } else {
        msg_print!(Message::StatusDisabled);
    }

    let renderer = config.renderer.clone().unwrap_or_else(ProcessRenderer::default_program);
    msg_print!(Message::StatusRenderer(renderer.display().to_string()));

    let targets = resolve_targets(&scheduler, &detected);
    for (index, geometry) in detected.iter().enumerate() {
        msg_print!(Message::StatusMonitor {
            index,
            geometry: *geometry,
            target: targets.iter().any(|target| target.geometry == *geometry),
        });
    }
    Ok(())
}

fn scope_name(scope: IdleScopeMode) -> &'static str {
    match scope {
        IdleScopeMode::System => "system",
        IdleScopeMode::PerMonitor => "per-monitor",
    }
}

fn detection_name(mode: DetectionMode) -> &'static str {
    match mode {
        DetectionMode::Input => "input",
        DetectionMode::Activity => "activity",
        DetectionMode::Both => "both",
    }
}
