//! Process-wide one-shot entry point.

use std::sync::{Arc, LazyLock, Mutex};

use crate::client::MetricsClient;
use crate::emitter::Emitter;
use crate::source::RuntimeSource;
use crate::Error;

struct StartState {
    started: bool,
    emitter: Option<Emitter>,
}

static START_STATE: LazyLock<Mutex<StartState>> = LazyLock::new(|| {
    Mutex::new(StartState {
        started: false,
        emitter: None,
    })
});

/// Starts the process-wide reporter with default options.
///
/// The first successful call wins and keeps its emitter running for the
/// remaining process lifetime; every later call returns
/// [`Error::AlreadyStarted`] without side effects. Concurrent callers race
/// safely: exactly one succeeds.
pub fn start(
    client: impl MetricsClient + 'static,
    source: Arc<dyn RuntimeSource>,
) -> Result<(), Error> {
    {
        let mut state = START_STATE.lock().unwrap();
        if state.started {
            return Err(Error::AlreadyStarted);
        }
        state.started = true;
        // The lock is not held across emitter construction.
    }

    match Emitter::new(client, source, None) {
        Ok(emitter) => {
            START_STATE.lock().unwrap().emitter = Some(emitter);
            Ok(())
        }
        Err(err) => {
            START_STATE.lock().unwrap().started = false;
            Err(err)
        }
    }
}

/// Stops the running emitter and clears the start flag so tests can start
/// again.
#[cfg(test)]
pub(crate) fn reset_for_test() {
    let emitter = {
        let mut state = START_STATE.lock().unwrap();
        state.started = false;
        state.emitter.take()
    };
    // Joins the worker outside the lock.
    drop(emitter);
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;
    use crate::testutil::{FakeRuntime, MockClient};

    // One test owns the process-wide state, covering the full lifecycle.
    #[test]
    fn only_one_concurrent_caller_wins() {
        let mock = MockClient::new();
        let fake = FakeRuntime::new();

        let barrier = Arc::new(Barrier::new(10));
        let mut handles = Vec::new();
        for _ in 0..10 {
            let mock = mock.clone();
            let source: Arc<dyn RuntimeSource> = fake.clone();
            let barrier = barrier.clone();
            handles.push(thread::spawn(move || {
                barrier.wait();
                start(mock, source)
            }));
        }

        let results: Vec<Result<(), Error>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(Error::AlreadyStarted)))
                .count(),
            9
        );

        // Still started: another call keeps failing.
        let source: Arc<dyn RuntimeSource> = fake.clone();
        assert!(matches!(
            start(mock.clone(), source),
            Err(Error::AlreadyStarted)
        ));

        // After a reset the guard opens up again.
        reset_for_test();
        let source: Arc<dyn RuntimeSource> = fake.clone();
        start(mock, source).unwrap();
        reset_for_test();
    }
}
