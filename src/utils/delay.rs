use rand::Rng;
use std::time::Duration;

/// Uniform random duration in `[min, max]`; `min` when the range is empty
pub fn jitter(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::thread_rng().gen_range(min.as_millis() as u64..=max.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Sleep for a jittered interval
pub async fn sleep_jitter((min, max): (Duration, Duration)) {
    let delay = jitter(min, max);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
