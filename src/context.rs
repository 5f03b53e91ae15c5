//! Cooperative cancellation and deadlines for API calls.
//!
//! Every network-issuing method takes a [`Context`]. The client checks it
//! before dispatch and races it against both the request and the body read,
//! so a cancelled or expired context always ends the call with
//! [`crate::Error::Cancelled`].

use std::fmt;
use std::future::{Future, pending};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a [`Context`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// [`CancelHandle::cancel`] was called.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "context cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for CancelReason {}

/// Cancellation signal and optional deadline for a call.
///
/// Clones share the same cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct Context {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Cancels the [`Context`] it was created with.
///
/// Dropping the handle without calling [`cancel`](Self::cancel) leaves the
/// context running.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the context. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context plus the handle that cancels it.
    ///
    /// # Examples
    /// ```
    /// use autosend_client::Context;
    ///
    /// let (ctx, handle) = Context::with_cancel();
    /// assert!(!ctx.is_done());
    /// handle.cancel();
    /// assert!(ctx.is_done());
    /// ```
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            signal: Some(rx),
            deadline: None,
        };
        (ctx, CancelHandle { tx })
    }

    /// Derive a context that also expires after `timeout`.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(at) => self.with_deadline(at),
            None => self,
        }
    }

    /// Derive a context that also expires at `at`. An earlier existing
    /// deadline is kept.
    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(at),
            None => at,
        });
        self
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<CancelReason> {
        if self.signal.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolve once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for [`Context::background`].
    pub async fn done(&self) -> CancelReason {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancelled() => CancelReason::Cancelled,
            () = deadline => CancelReason::DeadlineExceeded,
        }
    }

    /// Drive `future` until it completes or the context is done, whichever
    /// comes first. A context that is already done never polls `future`.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, CancelReason> {
        if let Some(reason) = self.err() {
            return Err(reason);
        }

        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            output = future => Ok(output),
        }
    }

    async fn cancelled(&self) {
        let Some(rx) = &self.signal else {
            return pending().await;
        };
        let mut rx = rx.clone();
        // The sender going away without cancelling leaves us live forever.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn cancelled_context_skips_the_future() {
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();
        handle.cancel();

        let mut polled = false;
        let result = ctx
            .run(async {
                polled = true;
            })
            .await;
        assert_eq!(result, Err(CancelReason::Cancelled));
        assert!(!polled);
    }

    #[tokio::test]
    async fn clones_share_cancellation() {
        let (ctx, handle) = Context::with_cancel();
        let clone = ctx.clone();
        handle.cancel();
        assert_eq!(clone.err(), Some(CancelReason::Cancelled));
    }

    #[tokio::test]
    async fn dropping_handle_does_not_cancel() {
        let (ctx, handle) = Context::with_cancel();
        drop(handle);
        assert!(!ctx.is_done());
        assert_eq!(ctx.run(async { "ok" }).await, Ok("ok"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_slow_future() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(result, Err(CancelReason::DeadlineExceeded));
        assert!(ctx.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_in_flight_future() {
        let (ctx, handle) = Context::with_cancel();
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        };
        let (result, ()) = tokio::join!(
            ctx.run(tokio::time::sleep(Duration::from_secs(10))),
            canceller
        );
        assert_eq!(result, Err(CancelReason::Cancelled));
    }

    #[test]
    fn huge_timeout_adds_no_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert!(!ctx.is_done());
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(5))
            .with_deadline(now + Duration::from_secs(60));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }
}
