//! Metrics collection and export for hookrelay.
//!
//! Wraps the `metrics` crate facade. Without a recorder installed every
//! macro call is a no-op; the `prometheus` feature installs an exporter
//! whose output can be rendered with [`MetricsHandle::render`].
//!
//! ```rust,ignore
//! use hookrelay_metrics::{counter, webhook};
//!
//! counter!(webhook::DELIVERY_ATTEMPTS_TOTAL).increment(1);
//! ```

mod definitions;
mod error;
mod recorder;

pub use {
    definitions::*,
    error::{Error, Result},
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
