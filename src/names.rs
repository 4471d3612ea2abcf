//! Canonical mapping from runtime metric names to the statsd namespace.

use std::sync::LazyLock;

use regex::Regex;

use crate::Error;

/// Grammar of a runtime metric name: a non-empty slash-separated path
/// followed by a unit of atoms joined by `*` or `/`. Taken verbatim from the
/// `runtime/metrics` documentation.
static RUNTIME_METRIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>/[^:]+):(?P<unit>[^:*/]+(?:[*/][^:*/]+)*)$").unwrap()
});

/// Maps a runtime metric name onto the stable dotted name reported to
/// statsd.
///
/// The path and unit keep their meaning but are flattened into the
/// `runtime.go.metrics.` namespace: `/gc/pauses:seconds` becomes
/// `runtime.go.metrics.gc_pauses.seconds`. The mapping is deterministic, so
/// the same runtime metric reports under the same name across runs and
/// runtime versions.
///
/// Returns [`Error::UnknownMetric`] for names that do not follow the
/// runtime naming convention.
pub fn datadog_metric_name(runtime_name: &str) -> Result<String, Error> {
    let caps = RUNTIME_METRIC_RE
        .captures(runtime_name)
        .ok_or_else(|| Error::UnknownMetric(runtime_name.to_owned()))?;

    let path = caps["name"]
        .trim_start_matches('/')
        .replace(['/', '-'], "_");
    let unit = caps["unit"].replace(['*', '/', '-'], "_");
    Ok(format!("runtime.go.metrics.{path}.{unit}"))
}

/// Returns whether the store will consider this runtime metric for
/// reporting.
///
/// The table is a deliberate superset of what any single runtime version
/// exposes: entries the current runtime does not know are tolerated, and
/// names the runtime exposes but the table does not are silently skipped.
pub fn is_supported_metric(name: &str) -> bool {
    SUPPORTED_METRICS.binary_search(&name).is_ok()
}

/// Runtime metrics considered safe to export. Sorted, for binary search.
static SUPPORTED_METRICS: &[&str] = &[
    "/cgo/go-to-c-calls:calls",
    "/cpu/classes/gc/mark/assist:cpu-seconds",
    "/cpu/classes/gc/mark/dedicated:cpu-seconds",
    "/cpu/classes/gc/mark/idle:cpu-seconds",
    "/cpu/classes/gc/pause:cpu-seconds",
    "/cpu/classes/gc/total:cpu-seconds",
    "/cpu/classes/idle:cpu-seconds",
    "/cpu/classes/scavenge/assist:cpu-seconds",
    "/cpu/classes/scavenge/background:cpu-seconds",
    "/cpu/classes/scavenge/total:cpu-seconds",
    "/cpu/classes/total:cpu-seconds",
    "/cpu/classes/user:cpu-seconds",
    "/gc/cycles/automatic:gc-cycles",
    "/gc/cycles/forced:gc-cycles",
    "/gc/cycles/total:gc-cycles",
    "/gc/gogc:percent",
    "/gc/gomemlimit:bytes",
    "/gc/heap/allocs-by-size:bytes",
    "/gc/heap/allocs:bytes",
    "/gc/heap/allocs:objects",
    "/gc/heap/frees-by-size:bytes",
    "/gc/heap/frees:bytes",
    "/gc/heap/frees:objects",
    "/gc/heap/goal:bytes",
    "/gc/heap/live:bytes",
    "/gc/heap/objects:objects",
    "/gc/heap/tiny/allocs:objects",
    "/gc/limiter/last-enabled:gc-cycle",
    "/gc/pauses:seconds",
    "/gc/scan/globals:bytes",
    "/gc/scan/heap:bytes",
    "/gc/scan/stack:bytes",
    "/gc/scan/total:bytes",
    "/gc/stack/starting-size:bytes",
    "/memory/classes/heap/free:bytes",
    "/memory/classes/heap/objects:bytes",
    "/memory/classes/heap/released:bytes",
    "/memory/classes/heap/stacks:bytes",
    "/memory/classes/heap/unused:bytes",
    "/memory/classes/metadata/mcache/free:bytes",
    "/memory/classes/metadata/mcache/inuse:bytes",
    "/memory/classes/metadata/mspan/free:bytes",
    "/memory/classes/metadata/mspan/inuse:bytes",
    "/memory/classes/metadata/other:bytes",
    "/memory/classes/os-stacks:bytes",
    "/memory/classes/other:bytes",
    "/memory/classes/profiling/buckets:bytes",
    "/memory/classes/total:bytes",
    "/sched/gomaxprocs:threads",
    "/sched/goroutines-created:goroutines",
    "/sched/goroutines/not-in-go:goroutines",
    "/sched/goroutines/runnable:goroutines",
    "/sched/goroutines/running:goroutines",
    "/sched/goroutines/waiting:goroutines",
    "/sched/goroutines:goroutines",
    "/sched/latencies:seconds",
    "/sched/pauses/stopping/gc:seconds",
    "/sched/pauses/stopping/other:seconds",
    "/sched/pauses/total/gc:seconds",
    "/sched/pauses/total/other:seconds",
    "/sched/threads/total:threads",
    "/sync/mutex/wait/total:seconds",
];
