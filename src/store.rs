//! Per-metric bookkeeping and the report cycle.

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use log::{debug, warn};

use crate::client::MetricsClient;
use crate::histogram::{DeltaHistogram, DISTRIBUTION_BUDGET};
use crate::names::{datadog_metric_name, is_supported_metric};
use crate::source::{Descriptor, Histogram, RuntimeSource, Sample, Value};
use crate::tags::{base_tags, TagCache, TAG_REFRESH_INTERVAL};

/// Gauge marking the reporter as alive; always 1.
const ENABLED_METRIC: &str = "runtime.go.metrics.enabled";
/// Count of values suppressed by validation.
const SKIPPED_METRIC: &str = "runtime.go.metrics.skipped_values";

const RATE: f64 = 1.0;

struct Slot {
    desc: Descriptor,
    dd_name: String,
    last_value: Option<f64>,
    last_counts: Option<Vec<u64>>,
}

/// Samples the runtime surface and drives the metrics client.
///
/// One slot per enabled metric, allocated at construction and kept for the
/// store's lifetime. Single-writer: only the owning emitter worker calls
/// [`report`](MetricStore::report), so slots need no locking.
pub(crate) struct MetricStore {
    source: Arc<dyn RuntimeSource>,
    client: Box<dyn MetricsClient>,
    slots: Vec<Slot>,
    samples: Vec<Sample>,
    tags: TagCache,
}

impl MetricStore {
    /// Builds slots for the intersection of what the source exposes and
    /// what the supported table allows, sorted by output name so client
    /// calls happen in a stable order.
    pub(crate) fn new(
        source: Arc<dyn RuntimeSource>,
        client: Box<dyn MetricsClient>,
        extra_tags: Vec<String>,
    ) -> Self {
        let mut slots = Vec::new();
        for desc in source.descriptions() {
            if !is_supported_metric(&desc.name) {
                debug!("skipping unsupported runtime metric {}", desc.name);
                continue;
            }
            match datadog_metric_name(&desc.name) {
                Ok(dd_name) => slots.push(Slot {
                    desc,
                    dd_name,
                    last_value: None,
                    last_counts: None,
                }),
                Err(err) => debug!("skipping runtime metric: {err}"),
            }
        }
        slots.sort_by(|a, b| a.dd_name.cmp(&b.dd_name));

        let samples = slots
            .iter()
            .map(|slot| Sample::new(slot.desc.name.clone()))
            .collect();

        let tag_source = source.clone();
        let produce = Box::new(move || {
            let mut tags = base_tags(tag_source.as_ref());
            tags.extend(extra_tags.iter().cloned());
            tags
        });
        let tags = TagCache::new(TAG_REFRESH_INTERVAL, Box::new(Instant::now), produce);

        MetricStore {
            source,
            client,
            slots,
            samples,
            tags,
        }
    }

    /// Runs one report cycle: read every sample in a single call, then emit
    /// slot by slot in output-name order.
    pub(crate) fn report(&mut self) {
        self.source.read(&mut self.samples);
        let now = SystemTime::now();

        let MetricStore {
            slots,
            samples,
            tags,
            client,
            ..
        } = self;
        let tags: &[String] = tags.fetch();
        let client = client.as_ref();

        let mut skipped: u64 = 0;
        for (slot, sample) in slots.iter_mut().zip(samples.iter()) {
            skipped += report_slot(client, slot, &sample.value, tags, now);
        }

        if skipped > 0 {
            warn!("skipped {skipped} invalid runtime metric values this cycle");
            if let Err(err) = client.count_with_timestamp(SKIPPED_METRIC, skipped as i64, tags, RATE, now)
            {
                debug!("failed to submit {SKIPPED_METRIC}: {err}");
            }
        }
        if let Err(err) = client.gauge_with_timestamp(ENABLED_METRIC, 1.0, tags, RATE, now) {
            debug!("failed to submit {ENABLED_METRIC}: {err}");
        }
    }
}

/// Handles one slot; returns how many values were skipped.
fn report_slot(
    client: &dyn MetricsClient,
    slot: &mut Slot,
    value: &Value,
    tags: &[String],
    now: SystemTime,
) -> u64 {
    match value {
        Value::Unset => {
            debug!("no sample value for {}", slot.desc.name);
            0
        }
        Value::Uint64(v) => report_scalar(client, slot, *v as f64, tags, now),
        Value::Float64(v) => report_scalar(client, slot, *v, tags, now),
        Value::Float64Histogram(hist) => report_histogram(client, slot, hist, tags, now),
    }
}

fn report_scalar(
    client: &dyn MetricsClient,
    slot: &mut Slot,
    current: f64,
    tags: &[String],
    now: SystemTime,
) -> u64 {
    if !current.is_finite() {
        debug!("non-finite value {current} for {}", slot.dd_name);
        return 1;
    }
    // Cumulative counters only report when they moved.
    if slot.desc.cumulative && slot.last_value == Some(current) {
        return 0;
    }
    slot.last_value = Some(current);
    if let Err(err) = client.gauge_with_timestamp(&slot.dd_name, current, tags, RATE, now) {
        debug!("failed to submit gauge {}: {err}", slot.dd_name);
    }
    0
}

fn report_histogram(
    client: &dyn MetricsClient,
    slot: &mut Slot,
    hist: &Histogram,
    tags: &[String],
    now: SystemTime,
) -> u64 {
    let delta = match DeltaHistogram::new(hist, slot.last_counts.as_deref()) {
        Ok(delta) => delta,
        Err(err) => {
            debug!("unusable histogram sample for {}: {err:?}", slot.dd_name);
            remember_counts(slot, hist);
            return 1;
        }
    };

    let Some(summary) = delta.summary() else {
        remember_counts(slot, hist);
        return 0;
    };

    for (suffix, value) in [
        ("avg", summary.avg),
        ("min", summary.min),
        ("max", summary.max),
        ("median", summary.median),
        ("p95", summary.p95),
        ("p99", summary.p99),
    ] {
        let name = format!("{}.{suffix}", slot.dd_name);
        if let Err(err) = client.gauge_with_timestamp(&name, value, tags, RATE, now) {
            debug!("failed to submit gauge {name}: {err}");
        }
    }

    let samples = delta.distribution_samples(DISTRIBUTION_BUDGET);
    if let Err(err) = client.distribution_samples(&slot.dd_name, &samples, tags, RATE) {
        debug!("failed to submit distribution {}: {err}", slot.dd_name);
    }

    remember_counts(slot, hist);
    0
}

/// Copies the current counts into the slot; never aliases the sample's
/// backing storage.
fn remember_counts(slot: &mut Slot, hist: &Histogram) {
    match &mut slot.last_counts {
        Some(stored) if stored.len() == hist.counts.len() => {
            stored.copy_from_slice(&hist.counts);
        }
        stored => *stored = Some(hist.counts.clone()),
    }
}
