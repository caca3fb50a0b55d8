use std::sync::{Arc, OnceLock};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why an in-flight operation was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// A newer invocation on the same runner started.
    Superseded,
    /// The runner's deadline elapsed first.
    TimedOut,
    /// The owning runner was shut down or dropped.
    Teardown,
}

impl CancelReason {
    /// Returns a stable label used in logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superseded => "superseded",
            Self::TimedOut => "timed_out",
            Self::Teardown => "teardown",
        }
    }
}

/// Cancellation handle passed to one runner operation.
///
/// The first recorded reason wins; later cancellations only re-signal the
/// already cancelled token.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Records the reason and cancels the token. Returns false when already cancelled.
    pub(crate) fn cancel(&self, reason: CancelReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    /// Returns whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the recorded reason, if cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    /// Completes once cancellation is requested.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Returns a child token for detached work that must stop with this operation.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelReason, CancelSignal};

    #[test]
    fn first_reason_wins() {
        let signal = CancelSignal::new();
        assert!(signal.reason().is_none());

        assert!(signal.cancel(CancelReason::TimedOut));
        assert!(!signal.cancel(CancelReason::Superseded));

        assert!(signal.is_cancelled());
        assert_eq!(signal.reason(), Some(CancelReason::TimedOut));
    }

    #[test]
    fn child_tokens_follow_parent() {
        let signal = CancelSignal::new();
        let child = signal.child_token();
        signal.cancel(CancelReason::Teardown);
        assert!(child.is_cancelled());
    }
}
