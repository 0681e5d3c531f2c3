//! Demo overlays for the settings GUI's "preview" button.

use crate::libs::config::{Config, ConfigStore};
use crate::libs::messages::Message;
use crate::libs::monitors::{MonitorEnumerator, SystemMonitors};
use crate::libs::overlay::{build_tasks, resolve_targets, ProcessRenderer, Renderer};
use crate::{msg_error, msg_error_anyhow, msg_info, msg_success, msg_warning};
use anyhow::Result;
use tokio::time::{self, Duration};

/// How long demo overlays stay up.
pub const PREVIEW_DURATION: Duration = Duration::from_secs(3);

pub async fn cmd() -> Result<()> {
    let store = ConfigStore::new()?;
    let config = store
        .load_async(&SystemMonitors)
        .await
        .map_err(|e| msg_error_anyhow!(Message::ConfigUnusable(e.to_string())))?;
    let renderer = ProcessRenderer::new(config.renderer.clone().unwrap_or_else(ProcessRenderer::default_program));

    show_preview(&renderer, &config, &SystemMonitors, PREVIEW_DURATION).await;
    msg_success!(Message::PreviewFinished);
    Ok(())
}

/// Shows demo overlays on the configured targets for `hold`, then closes them.
///
/// Returns how many overlays were shown. The `enabled` flag is ignored so the
/// user can try settings before switching overlays on.
pub async fn show_preview<R: Renderer>(renderer: &R, config: &Config, enumerator: &dyn MonitorEnumerator, hold: Duration) -> usize {
    let scheduler_config = config.scheduler();
    let targets = resolve_targets(&scheduler_config, &enumerator.enumerate());
    if targets.is_empty() {
        msg_warning!(Message::NoPreviewTargets);
        return 0;
    }

    let mut handles = Vec::new();
    for task in build_tasks(&scheduler_config, &targets, true) {
        match renderer.show(&task) {
            Ok(handle) => handles.push(handle),
            Err(e) => msg_error!(Message::OverlayLaunchFailed(e.to_string())),
        }
    }
    let shown = handles.len();
    msg_info!(Message::PreviewStarted(shown));

    time::sleep(hold).await;
    for handle in handles {
        renderer.terminate(handle);
    }
    shown
}
