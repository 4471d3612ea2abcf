//! Test doubles shared by the unit tests: a recording statsd client and a
//! scripted runtime surface.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use crate::client::MetricsClient;
use crate::source::{Descriptor, RuntimeSource, Sample, Value, ValueKind};

/// One recorded statsd submission.
#[derive(Clone, Debug)]
pub(crate) struct StatsdCall<T> {
    pub(crate) name: String,
    pub(crate) value: T,
    pub(crate) tags: Vec<String>,
    pub(crate) rate: f64,
}

#[derive(Default)]
struct MockCalls {
    gauges: Vec<StatsdCall<f64>>,
    counts: Vec<StatsdCall<i64>>,
    distributions: Vec<StatsdCall<Vec<f64>>>,
    fail: bool,
}

/// Records every client call; clones share the underlying call log.
#[derive(Clone, Default)]
pub(crate) struct MockClient {
    calls: Arc<Mutex<MockCalls>>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent submission fail without being recorded.
    pub(crate) fn fail_submissions(&self, fail: bool) {
        self.calls.lock().unwrap().fail = fail;
    }

    pub(crate) fn gauge_calls(&self) -> Vec<StatsdCall<f64>> {
        self.calls.lock().unwrap().gauges.clone()
    }

    pub(crate) fn count_calls(&self) -> Vec<StatsdCall<i64>> {
        self.calls.lock().unwrap().counts.clone()
    }

    pub(crate) fn distribution_calls(&self) -> Vec<StatsdCall<Vec<f64>>> {
        self.calls.lock().unwrap().distributions.clone()
    }

    pub(crate) fn gauges_with_suffix(&self, suffix: &str) -> Vec<StatsdCall<f64>> {
        self.gauge_calls()
            .into_iter()
            .filter(|call| call.name.ends_with(suffix))
            .collect()
    }

    fn check_fail(calls: &MockCalls) -> io::Result<()> {
        if calls.fail {
            Err(io::Error::new(io::ErrorKind::Other, "mock submission failure"))
        } else {
            Ok(())
        }
    }
}

impl MetricsClient for MockClient {
    fn gauge_with_timestamp(
        &self,
        name: &str,
        value: f64,
        tags: &[String],
        rate: f64,
        _ts: SystemTime,
    ) -> io::Result<()> {
        let mut calls = self.calls.lock().unwrap();
        Self::check_fail(&calls)?;
        calls.gauges.push(StatsdCall {
            name: name.to_owned(),
            value,
            tags: tags.to_vec(),
            rate,
        });
        Ok(())
    }

    fn count_with_timestamp(
        &self,
        name: &str,
        value: i64,
        tags: &[String],
        rate: f64,
        _ts: SystemTime,
    ) -> io::Result<()> {
        let mut calls = self.calls.lock().unwrap();
        Self::check_fail(&calls)?;
        calls.counts.push(StatsdCall {
            name: name.to_owned(),
            value,
            tags: tags.to_vec(),
            rate,
        });
        Ok(())
    }

    fn distribution_samples(
        &self,
        name: &str,
        values: &[f64],
        tags: &[String],
        rate: f64,
    ) -> io::Result<()> {
        let mut calls = self.calls.lock().unwrap();
        Self::check_fail(&calls)?;
        calls.distributions.push(StatsdCall {
            name: name.to_owned(),
            value: values.to_vec(),
            tags: tags.to_vec(),
            rate,
        });
        Ok(())
    }
}

struct FakeState {
    metrics: Vec<(Descriptor, Value)>,
    gc_percent: i64,
    memory_limit: i64,
    max_procs: i64,
    version: String,
}

/// A scripted runtime surface with settable tuning knobs.
pub(crate) struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(FakeRuntime {
            state: Mutex::new(FakeState {
                metrics: Vec::new(),
                gc_percent: 100,
                memory_limit: i64::MAX,
                max_procs: 8,
                version: "go1.26.0".to_owned(),
            }),
        })
    }

    /// Exposes a metric with an initial value.
    pub(crate) fn register(&self, name: &str, kind: ValueKind, cumulative: bool, value: Value) {
        self.state.lock().unwrap().metrics.push((
            Descriptor {
                name: name.to_owned(),
                kind,
                cumulative,
            },
            value,
        ));
    }

    /// Replaces the value of an already-registered metric.
    pub(crate) fn set_value(&self, name: &str, value: Value) {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .metrics
            .iter_mut()
            .find(|(desc, _)| desc.name == name)
            .unwrap_or_else(|| panic!("metric {name} not registered"));
        slot.1 = value;
    }

    pub(crate) fn set_gc_percent(&self, percent: i64) {
        self.state.lock().unwrap().gc_percent = percent;
    }

    pub(crate) fn set_memory_limit(&self, limit: i64) {
        self.state.lock().unwrap().memory_limit = limit;
    }

    pub(crate) fn set_max_procs(&self, procs: i64) {
        self.state.lock().unwrap().max_procs = procs;
    }
}

impl RuntimeSource for FakeRuntime {
    fn descriptions(&self) -> Vec<Descriptor> {
        let state = self.state.lock().unwrap();
        state.metrics.iter().map(|(desc, _)| desc.clone()).collect()
    }

    fn read(&self, samples: &mut [Sample]) {
        let state = self.state.lock().unwrap();
        for sample in samples {
            if let Some((_, value)) = state
                .metrics
                .iter()
                .find(|(desc, _)| desc.name == sample.name)
            {
                sample.value = value.clone();
            }
        }
    }

    fn gc_percent(&self) -> i64 {
        self.state.lock().unwrap().gc_percent
    }

    fn memory_limit(&self) -> i64 {
        self.state.lock().unwrap().memory_limit
    }

    fn max_procs(&self) -> i64 {
        self.state.lock().unwrap().max_procs
    }

    fn version(&self) -> String {
        self.state.lock().unwrap().version.clone()
    }
}
