//! # dcplus - Display Control+ background core
//!
//! Protects OLED monitors from burn-in: watches keyboard, mouse, controller
//! and OS idle signals and covers idle monitors with a full-screen overlay
//! until input resumes.
//!
//! ## Components
//!
//! - **Monitor enumeration**: ordered monitor rectangles, fail-soft
//! - **Input sources**: global hooks, XInput poller, raw-input backstop, OS idle gauge
//! - **Activity aggregation**: system-wide and per-monitor idle durations
//! - **Overlay scheduling**: idle/trigger/dismiss state machine with live config reload
//! - **Single instance**: PID marker shared with the settings GUI
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dcplus::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod libs;
