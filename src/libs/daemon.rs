//! Background process lifecycle.
//!
//! Claims the single-instance marker, wires the aggregator, input sources and
//! scheduler together and runs until SIGTERM/SIGINT (Ctrl+C on Windows). The
//! marker is released by the lock's destructor on every way out of [`run`].

use crate::libs::activity::ActivityAggregator;
use crate::libs::config::{Config, ConfigStore};
use crate::libs::error::DcError;
use crate::libs::instance::InstanceGuard;
use crate::libs::messages::Message;
use crate::libs::monitors::SystemMonitors;
use crate::libs::overlay::ProcessRenderer;
use crate::libs::scheduler::OverlayScheduler;
use crate::libs::sources::idle_gauge::SystemIdleGauge;
use crate::libs::sources::InputSources;
use crate::{msg_error, msg_info, msg_warning};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Duration;

/// Cadence of the aggregator's gauge sampling.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Runs the background scheduler until a shutdown signal arrives.
///
/// Returns immediately when another instance already holds the marker.
pub async fn run() -> Result<()> {
    let guard = InstanceGuard::new()?;
    let lock = match guard.acquire() {
        Ok(lock) => lock,
        Err(DcError::AlreadyRunning(pid)) => {
            msg_info!(Message::AlreadyRunning(pid));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    msg_info!(Message::BackgroundStarted(lock.pid()));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    spawn_signal_listener(shutdown_tx);

    let store = ConfigStore::new()?;
    let config = match store.load_async(&SystemMonitors).await {
        Ok(config) => config,
        Err(e) => {
            // The scheduler keeps retrying; start the sources with defaults meanwhile.
            msg_warning!(Message::ConfigUnusable(e.to_string()));
            Config::default()
        }
    };

    let aggregator = Arc::new(ActivityAggregator::new(Arc::new(SystemIdleGauge), config.detection()));
    let ticker = aggregator.clone().start_ticker(TICK_PERIOD);

    let mut sources = InputSources::new(aggregator.clone());
    sources.reconcile(&config.detection());

    let program = config.renderer.clone().unwrap_or_else(ProcessRenderer::default_program);
    if !program.exists() {
        msg_warning!(Message::RendererMissing(program.display().to_string()));
    }
    let renderer = ProcessRenderer::new(program);

    let mut scheduler = OverlayScheduler::new(aggregator, store, renderer, Box::new(SystemMonitors)).with_sources(sources);
    scheduler
        .run_until(async {
            let _ = shutdown_rx.await;
        })
        .await;

    ticker.abort();
    drop(lock);
    msg_info!(Message::BackgroundStopped);
    Ok(())
}

/// Resolves `shutdown_tx` on the first termination signal.
///
/// If no listener can be installed the sender is parked forever, since
/// dropping it would read as a shutdown request.
fn spawn_signal_listener(shutdown_tx: oneshot::Sender<()>) {
    #[cfg(unix)]
    {
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    msg_error!(Message::SignalHandlerFailed(e.to_string()));
                    std::future::pending::<()>().await;
                    return;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => msg_info!(Message::ReceivedSigterm),
                _ = sigint.recv() => msg_info!(Message::ReceivedSigint),
            }
            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => msg_info!(Message::ReceivedCtrlC),
                Err(e) => {
                    msg_error!(Message::SignalHandlerFailed(e.to_string()));
                    std::future::pending::<()>().await;
                }
            }
            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(not(any(unix, windows)))]
    {
        msg_warning!(Message::SignalHandlingNotSupported);
        tokio::spawn(async move {
            std::future::pending::<()>().await;
            let _ = shutdown_tx.send(());
        });
    }
}
