use std::{future::Future, time::Duration};

use tracing::{error, warn};

use crate::reply::Reply;

/// Guarantees every command gets an answer.
///
/// Command work runs on its own task and is raced against a deadline. When
/// the deadline wins the issuer gets the fallback text instead; the work
/// keeps running to completion in the background so no state change is cut
/// in half.
#[derive(Debug, Clone)]
pub struct ReplyWatchdog {
    timeout: Duration,
    fallback: String,
}

impl ReplyWatchdog {
    pub fn new(timeout: Duration, fallback: impl Into<String>) -> Self {
        Self {
            timeout,
            fallback: fallback.into(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The deadline in whole milliseconds, saturating at `u64::MAX`.
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// The reply sent when work is late or crashed.
    #[must_use]
    pub fn fallback(&self) -> Reply {
        Reply::ephemeral(self.fallback.clone())
    }

    pub async fn respond_within<F>(&self, work: F) -> Reply
    where
        F: Future<Output = Reply> + Send + 'static,
    {
        let task = tokio::spawn(work);
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!(error = %e, "command handler failed");
                self.fallback()
            },
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout_ms(),
                    "command reply timed out"
                );
                self.fallback()
            },
        }
    }
}
