//! `cadence` integration.
//!
//! `cadence` is a popular Statsd client for Rust. With the `cadence`
//! feature enabled, a `cadence::StatsdClient` can be passed directly
//! wherever the reporter expects a [`MetricsClient`]:
//!
//! ```rust,ignore
//! use cadence::{StatsdClient, UdpMetricSink};
//!
//! let client = StatsdClient::from_sink("", sink);
//! go_runtime_metrics::start(client, source)?;
//! ```
//!
//! The dogstatsd datagram format carries no submission timestamp, so the
//! timestamps passed through [`MetricsClient`] are not forwarded; values
//! land under the receiving agent's clock. Rates are likewise not forwarded
//! (the reporter always submits at rate 1).

use std::io;
use std::time::SystemTime;

use cadence::{Counted, Distributed, Gauged, StatsdClient};

use crate::client::MetricsClient;

impl MetricsClient for StatsdClient {
    fn gauge_with_timestamp(
        &self,
        name: &str,
        value: f64,
        tags: &[String],
        _rate: f64,
        _ts: SystemTime,
    ) -> io::Result<()> {
        let mut builder = self.gauge_with_tags(name, value);
        for tag in tags {
            builder = builder.with_tag_value(tag);
        }
        builder.try_send().map(drop).map_err(io_error)
    }

    fn count_with_timestamp(
        &self,
        name: &str,
        value: i64,
        tags: &[String],
        _rate: f64,
        _ts: SystemTime,
    ) -> io::Result<()> {
        let mut builder = self.count_with_tags(name, value);
        for tag in tags {
            builder = builder.with_tag_value(tag);
        }
        builder.try_send().map(drop).map_err(io_error)
    }

    fn distribution_samples(
        &self,
        name: &str,
        values: &[f64],
        tags: &[String],
        _rate: f64,
    ) -> io::Result<()> {
        for &value in values {
            let mut builder = self.distribution_with_tags(name, value);
            for tag in tags {
                builder = builder.with_tag_value(tag);
            }
            builder.try_send().map(drop).map_err(io_error)?;
        }
        Ok(())
    }
}

fn io_error(err: cadence::MetricError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}
