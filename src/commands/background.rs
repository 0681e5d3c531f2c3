use crate::libs::daemon;
use crate::libs::data_storage::DataStorage;
use crate::libs::logging;
use anyhow::Result;

/// Runs the background scheduler with logging to `overlay.log`.
pub async fn cmd() -> Result<()> {
    let storage = DataStorage::new();
    let _log_guard = logging::init_background(storage.base_path())?;
    daemon::run().await
}
