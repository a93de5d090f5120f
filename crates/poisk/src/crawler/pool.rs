//! Worker pool shared by every site crawl of one indexing run.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::errors::CrawlError;

/// Bounded fetch slots plus the run's stop signal. Clones share state.
#[derive(Debug, Clone)]
pub struct CrawlPool {
  permits: Arc<Semaphore>,
  cancel: CancellationToken,
}

impl CrawlPool {
  /// Pool with `max_concurrency` slots (at least one).
  pub fn new(max_concurrency: usize) -> Self {
    Self {
      permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
      cancel: CancellationToken::new(),
    }
  }

  /// Waits for a free slot.
  ///
  /// # Errors
  /// `CrawlError::Cancelled` once the pool is shut down.
  pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, CrawlError> {
    tokio::select! {
      biased;
      () = self.cancel.cancelled() => Err(CrawlError::Cancelled),
      permit = Arc::clone(&self.permits).acquire_owned() => {
        permit.map_err(|_| CrawlError::Cancelled)
      }
    }
  }

  /// Runs `future` until it completes or the pool is shut down.
  ///
  /// # Errors
  /// `CrawlError::Cancelled` when the shutdown wins.
  pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, CrawlError> {
    tokio::select! {
      biased;
      () = self.cancel.cancelled() => Err(CrawlError::Cancelled),
      output = future => Ok(output),
    }
  }

  /// Stops the run: wakes every waiter and refuses new slots.
  pub fn shutdown(&self) {
    self.cancel.cancel();
    self.permits.close();
  }

  /// Whether [`CrawlPool::shutdown`] was called.
  pub fn is_shut_down(&self) -> bool {
    self.cancel.is_cancelled()
  }
}
