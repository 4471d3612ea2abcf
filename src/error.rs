use thiserror::Error;

/// Errors surfaced by the public API.
///
/// Everything else that can go wrong during a report cycle (an unusable
/// sample, a failing client submission) is logged and swallowed so that a
/// bad cycle never kills the reporting worker.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The runtime metric name does not follow the `"/path:unit"` convention.
    #[error("unsupported runtime metric name: {0:?}")]
    UnknownMetric(String),

    /// The process-wide reporter has already been started.
    #[error("runtime metrics reporter already started")]
    AlreadyStarted,

    /// The emitter options failed validation.
    #[error("invalid emitter options: {0}")]
    InvalidOptions(&'static str),
}
