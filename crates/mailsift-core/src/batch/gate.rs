//! Collaborators the coordinator waits on: confirmation, cooldown, cancel.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::Notify;
use tracing::info;

use crate::classifier::ClassificationResult;
use crate::reader::Message;

/// Answer to a batch confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Apply every result.
    All,
    /// Apply the results at these indices.
    Some(Vec<usize>),
    /// Apply nothing.
    None,
}

impl Selection {
    /// Whether the result at `index` was selected.
    #[must_use]
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Some(indices) => indices.contains(&index),
            Self::None => false,
        }
    }
}

/// Asks a human (or a policy) before anything is applied.
pub trait ConfirmationGate {
    /// Decides which classified results of a batch to apply.
    fn confirm_batch(
        &self,
        results: &[ClassificationResult],
    ) -> impl Future<Output = Selection> + Send;

    /// Decides whether a drafted reply is sent. Declined drafts are saved.
    fn confirm_reply(&self, message: &Message, draft: &str) -> impl Future<Output = bool> + Send;
}

/// Gate that approves every batch and never sends replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConfirmationGate for AutoApprove {
    async fn confirm_batch(&self, _results: &[ClassificationResult]) -> Selection {
        Selection::All
    }

    async fn confirm_reply(&self, _message: &Message, _draft: &str) -> bool {
        false
    }
}

/// Suspends the coordinator between batches.
pub trait Pause {
    /// Waits out the cooldown.
    fn pause(&self) -> impl Future<Output = ()> + Send;
}

/// Sleeps for a random duration in `[min, max]`, ending early on cancel.
#[derive(Debug, Clone)]
pub struct CooldownPause {
    min: Duration,
    max: Duration,
    cancel: Option<CancelToken>,
}

impl CooldownPause {
    /// Creates a cooldown. Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            cancel: None,
        }
    }

    /// Wakes from the cooldown as soon as `cancel` fires.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Draws one cooldown length.
    #[must_use]
    pub fn jitter(&self) -> Duration {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Pause for CooldownPause {
    async fn pause(&self) {
        let wait = self.jitter();
        info!(seconds = wait.as_secs_f32(), "cooling down before next batch");
        let Some(cancel) = &self.cancel else {
            tokio::time::sleep(wait).await;
            return;
        };
        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            () = cancel.cancelled() => info!("cooldown interrupted"),
        }
    }
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cooperative cancellation checked between messages and batches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<CancelState>);

impl CancelToken {
    /// Creates an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes every waiter.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&self) {
        let notified = self.0.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        assert!(Selection::All.includes(7));
        assert!(!Selection::None.includes(0));
        let some = Selection::Some(vec![0, 2]);
        assert!(some.includes(2));
        assert!(!some.includes(1));
    }

    #[tokio::test]
    async fn test_auto_approve() {
        assert_eq!(AutoApprove.confirm_batch(&[]).await, Selection::All);
        let message = crate::testing::message("m", "a@b", "s");
        assert!(!AutoApprove.confirm_reply(&message, "draft").await);
    }

    #[test]
    fn test_jitter_within_bounds() {
        let pause = CooldownPause::new(Duration::from_secs(40), Duration::from_secs(20));
        for _ in 0..50 {
            let wait = pause.jitter();
            assert!(wait >= Duration::from_secs(20) && wait <= Duration::from_secs(40));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_sleeps() {
        let pause = CooldownPause::new(Duration::from_secs(20), Duration::from_secs(20));
        let started = tokio::time::Instant::now();
        pause.pause().await;
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_cuts_cooldown_short() {
        let cancel = CancelToken::new();
        let pause = CooldownPause::new(Duration::from_secs(20), Duration::from_secs(20))
            .with_cancel(cancel.clone());
        let started = tokio::time::Instant::now();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        });
        pause.pause().await;
        canceller.await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_after_cancel_returns_at_once() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let pause = CooldownPause::new(Duration::from_secs(20), Duration::from_secs(30))
            .with_cancel(cancel);
        let started = tokio::time::Instant::now();
        pause.pause().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_cancel_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
