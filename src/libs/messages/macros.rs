//! Convenient macros for application messaging and logging.
//!
//! Every macro takes a [`Message`](super::Message) (or anything `Display`) and
//! routes it to one of two sinks:
//!
//! ```text
//! msg_info!(..) ──▶ routed to tracing? ──yes──▶ tracing::info!  (overlay.log)
//!                          │
//!                          no──▶ println! / eprintln!
//! ```
//!
//! Messages go to `tracing` once the background logger is installed, or when
//! `DCPLUS_DEBUG` or `RUST_LOG` is set. Interactive commands otherwise print
//! plain lines to the console.
//!
//! ## Usage Examples
//!
//! ```rust
//! use dcplus::{msg_info, msg_warning};
//! use dcplus::libs::messages::Message;
//!
//! msg_info!(Message::SchedulerStopped);
//! msg_warning!(Message::NoMonitorsDetected);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Set once a tracing subscriber that writes somewhere useful is installed.
static TRACING_ROUTE: AtomicBool = AtomicBool::new(false);

/// Cached result of the environment check.
static DEBUG_ENV: OnceLock<bool> = OnceLock::new();

/// Sends every subsequent message through `tracing`.
pub fn route_to_tracing() {
    TRACING_ROUTE.store(true, Ordering::SeqCst);
}

/// Whether messages currently go to `tracing` instead of the console.
///
/// True after [`route_to_tracing`], or when `DCPLUS_DEBUG` or `RUST_LOG` is
/// present in the environment. The environment is read once.
#[doc(hidden)]
pub fn is_debug_mode() -> bool {
    TRACING_ROUTE.load(Ordering::Relaxed)
        || *DEBUG_ENV.get_or_init(|| std::env::var("DCPLUS_DEBUG").is_ok() || std::env::var("RUST_LOG").is_ok())
}

/// Prints a general message with automatic routing.
///
/// ```text
/// msg_print!(Message::StatusNotRunning);
/// // Output: "Background scheduler: not running"
/// ```
#[macro_export]
macro_rules! msg_print {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("{}", $msg);
        } else {
            println!("{}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\n{}\n", $msg);
        } else {
            println!("\n{}\n", $msg);
        }
    };
}

/// Prints a success message with ✅ prefix.
#[macro_export]
macro_rules! msg_success {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("✅ {}", $msg);
        } else {
            println!("✅ {}", $msg);
        }
    };
}

/// Prints an error message with ❌ prefix.
///
/// Errors go to stderr when not routed to `tracing`, so scripts driving the
/// CLI can separate them from normal output.
#[macro_export]
macro_rules! msg_error {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::error!("❌ {}", $msg);
        } else {
            eprintln!("❌ {}", $msg);
        }
    };
}

/// Prints a warning message with ⚠️ prefix.
///
/// Warnings mark degraded operation, such as an input source that did not start.
#[macro_export]
macro_rules! msg_warning {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::warn!("⚠️ {}", $msg);
        } else {
            println!("⚠️ {}", $msg);
        }
    };
}

/// Prints an informational message with ℹ️ prefix.
#[macro_export]
macro_rules! msg_info {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("ℹ️ {}", $msg);
        } else {
            println!("ℹ️ {}", $msg);
        }
    };
    ($msg:expr, true) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::info!("\nℹ️ {}\n", $msg);
        } else {
            println!("\nℹ️ {}\n", $msg);
        }
    };
}

/// Debug-only message with 🔍 prefix; silent unless routed to `tracing`.
///
/// Used for the high-frequency paths (input events, gauge summaries), which
/// are rate limited at the call site.
#[macro_export]
macro_rules! msg_debug {
    ($msg:expr) => {
        if $crate::libs::messages::macros::is_debug_mode() {
            tracing::debug!("🔍 {}", $msg);
        }
    };
}

/// Creates an `anyhow::Error` from a message with ❌ prefix.
///
/// ```rust
/// use anyhow::Result;
/// use dcplus::{msg_error_anyhow, libs::messages::Message};
///
/// fn require_monitors(count: usize) -> Result<()> {
///     if count == 0 {
///         return Err(msg_error_anyhow!(Message::NoMonitorsDetected));
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! msg_error_anyhow {
    ($msg:expr) => {
        anyhow::anyhow!("❌ {}", $msg)
    };
}
