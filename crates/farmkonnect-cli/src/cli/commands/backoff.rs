//! `farmkonnect backoff` – print the retry delay schedule.

use anyhow::Result;
use farmkonnect_core::config::ClientConfig;
use farmkonnect_core::retry::RetryPolicy;

/// One row per retry: (retry number, base delay ms, upper bound with jitter ms).
pub(crate) fn schedule(policy: &RetryPolicy, retries: u32) -> Vec<(u32, u128, u128)> {
    (0..retries)
        .map(|attempt| {
            (
                attempt + 1,
                policy.base_delay(attempt).as_millis(),
                policy.delay_with_sample(attempt, 1.0).as_millis(),
            )
        })
        .collect()
}

pub fn run_backoff(cfg: &ClientConfig, retries: Option<u32>) -> Result<()> {
    let policy = cfg.retry_policy()?;
    let retries = retries.unwrap_or(policy.max_retries.saturating_sub(1));
    println!(
        "max_retries={} initial={}ms max={}ms multiplier={}",
        policy.max_retries,
        policy.initial_delay.as_millis(),
        policy.max_delay.as_millis(),
        policy.backoff_multiplier
    );
    println!("  {:>5}  {:>10}  {:>10}", "Retry", "Base(ms)", "Max(ms)");
    for (n, base, max) in schedule(&policy, retries) {
        println!("  {:>5}  {:>10}  {:>10}", n, base, max);
    }
    Ok(())
}
