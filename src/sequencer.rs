//! Request sequencing for overlapping recomputations
//!
//! Every request takes a token before it starts loading. When it finishes,
//! its result is applied only if no newer request has been applied already,
//! so a slow, stale computation can never overwrite a fresher one.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct RequestSequencer {
  issued: AtomicU64,
  applied: AtomicU64,
}

impl RequestSequencer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Token for a new request; strictly greater than every earlier token
  pub fn begin(&self) -> RequestToken {
    RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
  }

  /// Mark `token` applied if it is newer than the last applied token.
  /// Returns false for a stale result, which the caller must discard.
  pub fn try_apply(&self, token: RequestToken) -> bool {
    let previous = self.applied.fetch_max(token.0, Ordering::SeqCst);
    previous < token.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[test]
  fn test_tokens_increase() {
    let sequencer = RequestSequencer::new();
    let first = sequencer.begin();
    let second = sequencer.begin();
    assert!(second > first);
  }

  #[test]
  fn test_stale_result_is_rejected() {
    // Arrange: two overlapping requests
    let sequencer = RequestSequencer::new();
    let older = sequencer.begin();
    let newer = sequencer.begin();

    // Act: the newer one resolves first
    let newer_applied = sequencer.try_apply(newer);
    let older_applied = sequencer.try_apply(older);

    // Assert
    assert!(newer_applied);
    assert!(!older_applied);
  }

  #[test]
  fn test_in_order_results_all_apply() {
    let sequencer = RequestSequencer::new();
    let first = sequencer.begin();
    assert!(sequencer.try_apply(first));
    let second = sequencer.begin();
    assert!(sequencer.try_apply(second));
    // Applying the same token twice is a no-op
    assert!(!sequencer.try_apply(second));
  }

  #[tokio::test]
  async fn test_late_resolving_task_loses() {
    let sequencer = Arc::new(RequestSequencer::new());
    let (slow_tx, slow_rx) = tokio::sync::oneshot::channel::<()>();

    let slow = {
      let sequencer = Arc::clone(&sequencer);
      let token = sequencer.begin();
      tokio::spawn(async move {
        let _ = slow_rx.await;
        sequencer.try_apply(token)
      })
    };
    let fast = {
      let sequencer = Arc::clone(&sequencer);
      let token = sequencer.begin();
      tokio::spawn(async move { sequencer.try_apply(token) })
    };

    assert!(fast.await.unwrap());
    slow_tx.send(()).unwrap();
    assert!(!slow.await.unwrap());
  }
}
