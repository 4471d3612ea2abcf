//! The periodic reporting worker.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::client::MetricsClient;
use crate::source::RuntimeSource;
use crate::store::MetricStore;
use crate::Error;

/// Default time between report cycles.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);

/// Configuration for [`Emitter::new`].
#[derive(Clone, Debug)]
pub struct Options {
    /// Time between report cycles.
    ///
    /// Default: 10 seconds
    pub period: Duration,

    /// Tags appended to every emission, after the process-identity tags.
    ///
    /// Default: empty
    pub extra_tags: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            period: DEFAULT_PERIOD,
            extra_tags: Vec::new(),
        }
    }
}

impl Options {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time between report cycles.
    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Sets the tags appended to every emission.
    #[must_use]
    pub fn with_extra_tags(mut self, tags: Vec<String>) -> Self {
        self.extra_tags = tags;
        self
    }
}

/// Owns the single worker that periodically reports runtime metrics.
pub struct Emitter {
    shutdown: Arc<(Mutex<bool>, Condvar)>,
    worker: Option<JoinHandle<()>>,
}

impl Emitter {
    /// Starts a reporting worker that drives `client` with samples from
    /// `source`.
    ///
    /// `None` options use the defaults. The only failure is option
    /// validation: a zero period is rejected.
    pub fn new(
        client: impl MetricsClient + 'static,
        source: Arc<dyn RuntimeSource>,
        options: Option<Options>,
    ) -> Result<Emitter, Error> {
        let options = options.unwrap_or_default();
        if options.period.is_zero() {
            return Err(Error::InvalidOptions("period must be non-zero"));
        }
        let period = options.period;

        let mut store = MetricStore::new(source, Box::new(client), options.extra_tags);

        #[allow(clippy::mutex_atomic)]
        let shutdown = Arc::new((Mutex::new(false), Condvar::new()));

        let worker_shutdown = shutdown.clone();
        let worker = std::thread::Builder::new()
            .name("runtime-metrics-emitter".into())
            .spawn(move || {
                let (lock, cvar) = worker_shutdown.as_ref();
                let mut stopped = lock.lock().unwrap();
                // check this immediately, in case the owner is already
                // shutting down
                if *stopped {
                    return;
                }
                let mut last_report = Instant::now();
                loop {
                    let timeout = period
                        .checked_sub(last_report.elapsed())
                        .unwrap_or(Duration::ZERO);
                    stopped = cvar.wait_timeout(stopped, timeout).unwrap().0;
                    if *stopped {
                        return;
                    }
                    if last_report.elapsed() >= period {
                        store.report();
                        last_report = Instant::now();
                    }
                }
            })
            .unwrap();

        Ok(Emitter {
            shutdown,
            worker: Some(worker),
        })
    }

    /// Stops the worker, waiting for a mid-flight cycle to finish.
    ///
    /// Once this returns the metrics client sees no further calls from this
    /// emitter. Subsequent calls are no-ops.
    pub fn stop(&mut self) {
        let (lock, cvar) = self.shutdown.as_ref();
        *lock.lock().unwrap() = true;
        cvar.notify_one();

        if let Some(worker) = self.worker.take() {
            worker.join().ok();
        }
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        self.stop();
    }
}
