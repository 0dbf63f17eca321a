use std::time::Duration;

use crate::error::ProviderError;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_UNIT: Duration = Duration::from_millis(2_000);
pub const TIMEOUT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const FORWARD_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(15);
pub const REVERSE_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub timeout_retry_delay: Duration,
    pub forward_timeout: Duration,
    pub reverse_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_unit: BACKOFF_UNIT,
            timeout_retry_delay: TIMEOUT_RETRY_DELAY,
            forward_timeout: FORWARD_ATTEMPT_TIMEOUT,
            reverse_timeout: REVERSE_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based), or `None`
    /// when the failure is permanent or the attempt budget is spent.
    pub fn delay_for(&self, failure: &ProviderError, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        match failure {
            ProviderError::Timeout => Some(self.timeout_retry_delay),
            ProviderError::RateLimited | ProviderError::Server(_) | ProviderError::Network(_) => {
                Some(self.backoff_unit * attempt)
            }
            ProviderError::Client(_) | ProviderError::Malformed(_) => None,
        }
    }
}
