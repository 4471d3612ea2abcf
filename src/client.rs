//! The downstream metrics client capability.

use std::io;
use std::sync::Arc;
use std::time::SystemTime;

/// The narrow write-only statsd capability consumed by the reporter.
///
/// This matches the dogstatsd client surface the reporter needs: gauges and
/// counts carry the timestamp of the report cycle they were taken in, and
/// distributions submit raw samples. The reporter always passes a rate of
/// `1.0`.
///
/// With the `cadence` feature enabled, `cadence::StatsdClient` implements
/// this trait and can be passed in directly.
pub trait MetricsClient: Send + Sync {
    /// Submits a gauge reading taken at `ts`.
    fn gauge_with_timestamp(
        &self,
        name: &str,
        value: f64,
        tags: &[String],
        rate: f64,
        ts: SystemTime,
    ) -> io::Result<()>;

    /// Submits a count increment observed at `ts`.
    fn count_with_timestamp(
        &self,
        name: &str,
        value: i64,
        tags: &[String],
        rate: f64,
        ts: SystemTime,
    ) -> io::Result<()>;

    /// Submits raw distribution samples.
    fn distribution_samples(
        &self,
        name: &str,
        values: &[f64],
        tags: &[String],
        rate: f64,
    ) -> io::Result<()>;
}

impl<T: MetricsClient + ?Sized> MetricsClient for Arc<T> {
    fn gauge_with_timestamp(
        &self,
        name: &str,
        value: f64,
        tags: &[String],
        rate: f64,
        ts: SystemTime,
    ) -> io::Result<()> {
        (**self).gauge_with_timestamp(name, value, tags, rate, ts)
    }

    fn count_with_timestamp(
        &self,
        name: &str,
        value: i64,
        tags: &[String],
        rate: f64,
        ts: SystemTime,
    ) -> io::Result<()> {
        (**self).count_with_timestamp(name, value, tags, rate, ts)
    }

    fn distribution_samples(
        &self,
        name: &str,
        values: &[f64],
        tags: &[String],
        rate: f64,
    ) -> io::Result<()> {
        (**self).distribution_samples(name, values, tags, rate)
    }
}
