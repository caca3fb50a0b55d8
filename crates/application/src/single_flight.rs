use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use scholardesk_core::{AppError, AppResult};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

mod signal;

pub use signal::{CancelReason, CancelSignal};

/// Deadline applied when a runner is built without an explicit timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct RunnerState {
    latest_request_id: u64,
    current: Option<CancelSignal>,
}

enum Settlement<T> {
    Finished(AppResult<T>),
    TimedOut,
    Cancelled,
}

/// Latest-wins executor for one view's asynchronous requests.
///
/// Every [`execute`](Self::execute) supersedes the previous invocation: the
/// older operation is cancelled and its outcome is discarded without calling
/// either callback. Operations that outlive the runner's timeout are cancelled
/// and reported through `on_error` as [`AppError::Timeout`].
///
/// Dropping the runner cancels whatever is still pending.
#[derive(Debug)]
pub struct SingleFlightRunner {
    timeout: Duration,
    state: Arc<Mutex<RunnerState>>,
}

impl Default for SingleFlightRunner {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl SingleFlightRunner {
    /// Creates a runner with the given per-operation deadline.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: Arc::new(Mutex::new(RunnerState::default())),
        }
    }

    /// Returns the per-operation deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether the latest operation has not settled yet.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock_state(&self.state).current.is_some()
    }

    /// Starts `operation`, superseding any operation still in flight.
    ///
    /// `on_success` and `on_error` run only if this invocation is still the
    /// latest one when it settles. Supersession is never reported.
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute<T, Op, Fut, OnSuccess, OnError>(
        &self,
        operation: Op,
        on_success: OnSuccess,
        on_error: OnError,
    ) -> JoinHandle<()>
    where
        T: Send + 'static,
        Op: FnOnce(CancelSignal) -> Fut,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
        OnSuccess: FnOnce(T) + Send + 'static,
        OnError: FnOnce(AppError) + Send + 'static,
    {
        let signal = CancelSignal::new();
        let request_id = {
            let mut state = lock_state(&self.state);
            state.latest_request_id = state.latest_request_id.wrapping_add(1);
            if let Some(previous) = state.current.replace(signal.clone()) {
                previous.cancel(CancelReason::Superseded);
            }
            state.latest_request_id
        };

        let future = operation(signal.clone());
        let state = Arc::clone(&self.state);
        let timeout = self.timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        tokio::spawn(async move {
            let settlement = tokio::select! {
                biased;
                () = signal.cancelled() => Settlement::Cancelled,
                result = future => Settlement::Finished(result),
                () = tokio::time::sleep(timeout) => Settlement::TimedOut,
            };

            if matches!(settlement, Settlement::TimedOut) {
                signal.cancel(CancelReason::TimedOut);
            }

            if !settle_latest(&state, request_id) {
                debug!(
                    request_id,
                    reason = signal.reason().map_or("stale", |reason| reason.as_str()),
                    "discarding superseded request outcome"
                );
                return;
            }

            match settlement {
                Settlement::Finished(Ok(value)) => on_success(value),
                Settlement::Finished(Err(error)) => {
                    debug!(request_id, error = %error, "request failed");
                    on_error(error);
                }
                Settlement::TimedOut => {
                    warn!(request_id, timeout_ms, "request timed out");
                    on_error(AppError::Timeout(format!(
                        "request did not complete within {timeout_ms} ms"
                    )));
                }
                Settlement::Cancelled => {
                    debug!(
                        request_id,
                        reason = signal.reason().map_or("unknown", |reason| reason.as_str()),
                        "request cancelled"
                    );
                }
            }
        })
    }

    /// Cancels the pending operation and invalidates every outstanding callback.
    pub fn shutdown(&self) {
        let mut state = lock_state(&self.state);
        state.latest_request_id = state.latest_request_id.wrapping_add(1);
        if let Some(current) = state.current.take() {
            current.cancel(CancelReason::Teardown);
        }
    }
}

impl Drop for SingleFlightRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Returns true and marks the runner idle when `request_id` is still the latest.
fn settle_latest(state: &Mutex<RunnerState>, request_id: u64) -> bool {
    let mut state = lock_state(state);
    if state.latest_request_id != request_id {
        return false;
    }

    state.current = None;
    true
}

fn lock_state(state: &Mutex<RunnerState>) -> MutexGuard<'_, RunnerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
