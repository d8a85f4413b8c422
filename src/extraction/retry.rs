use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry_count + 1`: `base_delay * 2^retry_count`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry_count))
    }
}

/// Bookkeeping for one unit of work (a meal or a day). Lives only as long as
/// the extraction loop that owns it.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    policy: RetryPolicy,
    retry_count: u32,
    last_error: Option<String>,
}

impl ExtractionAttempt {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            retry_count: 0,
            last_error: None,
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// 1-based number of the call about to be made.
    pub fn call_number(&self) -> u32 {
        self.retry_count + 1
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Records a failed call. Returns the backoff to wait before the next
    /// call, or `None` once the retry budget is spent.
    pub fn record_failure(&mut self, error: impl Into<String>) -> Option<Duration> {
        self.last_error = Some(error.into());
        if self.retry_count >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.delay_for(self.retry_count);
        self.retry_count += 1;
        Some(delay)
    }
}
