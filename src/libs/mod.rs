//! Core library modules for dcplus.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dcplus::libs::activity::ActivityAggregator;
//! use dcplus::libs::config::DetectionConfig;
//! use dcplus::libs::sources::idle_gauge::SystemIdleGauge;
//! use std::sync::Arc;
//!
//! let aggregator = ActivityAggregator::new(Arc::new(SystemIdleGauge), DetectionConfig::default());
//! aggregator.mark_input(Some((100, 100)));
//! let idle = aggregator.get_idle_times().system();
//! ```

pub mod activity;
pub mod config;
pub mod daemon;
pub mod data_storage;
pub mod error;
pub mod instance;
pub mod logging;
pub mod messages;
pub mod monitors;
pub mod overlay;
pub mod scheduler;
pub mod sources;
