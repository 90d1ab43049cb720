use std::time::Duration;
use tokio::time::sleep;

/// Delay before retry number `retry_count + 1`: `base * (retry_count + 2)`.
///
/// Grows linearly and starts at twice the base delay. No jitter.
#[must_use]
pub fn backoff_delay(base: Duration, retry_count: u32) -> Duration {
    base.saturating_mul(retry_count.saturating_add(2))
}

/// Suspend the current task for `duration` without blocking the runtime.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
