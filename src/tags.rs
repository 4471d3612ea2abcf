//! Process-identity tags attached to every emission.

use std::time::{Duration, Instant};

use crate::source::RuntimeSource;

/// How long a produced tag set is served from cache before the knobs are
/// read again.
pub(crate) const TAG_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Reads the tuning knobs and produces the base tag set.
///
/// The four tags are always present, in this order: `gogc`, `gomemlimit`,
/// `gomaxprocs`, `goversion`. Values are read at the moment of the call; any
/// caching is the caller's job via [`TagCache`].
pub(crate) fn base_tags(source: &dyn RuntimeSource) -> Vec<String> {
    let gogc = match source.gc_percent() {
        -1 => "off".to_owned(),
        percent => percent.to_string(),
    };
    let gomemlimit = match source.memory_limit() {
        i64::MAX => "unlimited".to_owned(),
        limit => format_byte_size(limit.max(0) as u64),
    };
    vec![
        format!("gogc:{gogc}"),
        format!("gomemlimit:{gomemlimit}"),
        format!("gomaxprocs:{}", source.max_procs()),
        format!("goversion:{}", source.version()),
    ]
}

/// Formats a byte count as a binary-IEC size, rounding down at each 1024
/// threshold: `0 B`, `1023 B`, `1 KiB`, ..., `1 EiB`.
pub(crate) fn format_byte_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{} {}iB", bytes / div, ['K', 'M', 'G', 'T', 'P', 'E'][exp])
}

type TagProducer = Box<dyn FnMut() -> Vec<String> + Send>;
type Clock = Box<dyn FnMut() -> Instant + Send>;

/// Time-based memoization of a tag producer.
///
/// Refreshes strictly at or after `last_refresh + interval`, never within
/// it. Only the emitter worker calls [`fetch`](TagCache::fetch), so no
/// locking is needed.
pub(crate) struct TagCache {
    interval: Duration,
    clock: Clock,
    produce: TagProducer,
    last_refresh: Option<Instant>,
    tags: Vec<String>,
}

impl TagCache {
    pub(crate) fn new(interval: Duration, clock: Clock, produce: TagProducer) -> Self {
        TagCache {
            interval,
            clock,
            produce,
            last_refresh: None,
            tags: Vec::new(),
        }
    }

    /// Returns the cached tags, re-producing them when the interval has
    /// elapsed.
    pub(crate) fn fetch(&mut self) -> &[String] {
        let now = (self.clock)();
        let stale = match self.last_refresh {
            None => true,
            Some(at) => now.duration_since(at) >= self.interval,
        };
        if stale {
            self.tags = (self.produce)();
            self.last_refresh = Some(now);
        }
        &self.tags
    }
}
