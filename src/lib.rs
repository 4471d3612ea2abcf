//! Go-convention runtime metrics reporting for dogstatsd.
//!
//! This crate is a long-running in-process reporter: it periodically samples
//! a runtime self-instrumentation surface named in the `runtime/metrics`
//! convention (`/gc/pauses:seconds`, `/sched/goroutines:goroutines`, ...)
//! and forwards the result to a Datadog statsd client under the stable
//! `runtime.go.metrics.` namespace.
//!
//! # Overview
//!
//! - Scalar metrics report as gauges; cumulative counters only report when
//!   they moved.
//! - Cumulative bucketed histograms are diffed between reports and reduced
//!   to six summary gauges (`.avg`, `.min`, `.max`, `.median`, `.p95`,
//!   `.p99`) plus a bounded stream of raw distribution samples.
//! - Every emission carries the process-identity tags `gogc`, `gomemlimit`,
//!   `gomaxprocs` and `goversion`, plus any configured extra tags.
//! - Two meta-metrics track the reporter itself: the gauge
//!   `runtime.go.metrics.enabled` (always 1) and the count
//!   `runtime.go.metrics.skipped_values` (values suppressed by validation).
//!
//! The instrumented runtime is abstracted behind the [`RuntimeSource`]
//! trait; the downstream client behind [`MetricsClient`]. With the default
//! `cadence` feature, a `cadence::StatsdClient` can be used as the client
//! directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use go_runtime_metrics::{Emitter, Options};
//!
//! let emitter = Emitter::new(
//!     statsd_client,
//!     Arc::new(my_runtime_source),
//!     Some(Options::new().with_period(Duration::from_secs(10))),
//! )?;
//! // ... later:
//! // emitter.stop();
//! ```
//!
//! Alternatively, [`start`] runs a process-wide emitter with default
//! options; only the first call succeeds.

#![warn(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "cadence")]
mod cadence;
mod client;
mod emitter;
mod error;
mod histogram;
mod names;
mod source;
mod start;
mod store;
mod tags;

#[cfg(test)]
mod testutil;

pub use client::MetricsClient;
pub use emitter::{Emitter, Options, DEFAULT_PERIOD};
pub use error::Error;
pub use names::{datadog_metric_name, is_supported_metric};
pub use source::{Descriptor, Histogram, RuntimeSource, Sample, Value, ValueKind};
pub use start::start;
