//! Bounded label polling with exponential backoff.
//!
//! Label generation is asynchronous on the carrier side: a fresh batch
//! answers 404 until the documents are rendered. The loop is an ordinary
//! async fn, so a caller that stops waiting just drops the future.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::client::CarrierError;

/// One polling attempt against the label endpoint.
#[derive(Debug)]
pub enum LabelPoll {
    Ready { bytes: Vec<u8>, mime: Option<String> },
    /// 404 from the carrier. Expected while the label renders.
    NotReady,
}

#[async_trait]
pub trait LabelSource: Send + Sync {
    async fn fetch_label(&self, batch_id: &str) -> Result<LabelPoll, CarrierError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            initial_delay: Duration::from_millis(300),
            multiplier: 1.5,
            max_delay: Duration::from_millis(2000),
        }
    }
}

impl PollPolicy {
    /// Sleep durations between attempts: initial * multiplier^n, capped.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let mut ms = self.initial_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;
        std::iter::from_fn(move || {
            let current = ms;
            ms = ((ms as f64 * self.multiplier) as u64).min(cap);
            Some(Duration::from_millis(current))
        })
    }
}

/// Poll until the label is ready or attempts run out.
///
/// Exhaustion is not an error: the caller proceeds with a pending record
/// and the label is fetched on a later manual retry. Any carrier response
/// other than ready/404 aborts immediately.
pub async fn poll_for_label(
    source: &dyn LabelSource,
    batch_id: &str,
    policy: PollPolicy,
) -> Result<Option<(Vec<u8>, Option<String>)>, CarrierError> {
    let mut delays = policy.delays();
    for attempt in 1..=policy.max_attempts {
        match source.fetch_label(batch_id).await? {
            LabelPoll::Ready { bytes, mime } => {
                debug!(batch_id, attempt, "label ready");
                return Ok(Some((bytes, mime)));
            }
            LabelPoll::NotReady => {
                debug!(batch_id, attempt, "label not ready yet");
            }
        }
        if attempt < policy.max_attempts {
            // Unwrap is fine: delays() is an infinite iterator.
            tokio::time::sleep(delays.next().unwrap()).await;
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct ReadyAfter {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl LabelSource for ReadyAfter {
        async fn fetch_label(&self, _batch_id: &str) -> Result<LabelPoll, CarrierError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Ok(LabelPoll::NotReady)
            } else {
                Ok(LabelPoll::Ready {
                    bytes: b"%PDF-label".to_vec(),
                    mime: Some("application/pdf".to_string()),
                })
            }
        }
    }

    struct AlwaysFailing;

    #[async_trait]
    impl LabelSource for AlwaysFailing {
        async fn fetch_label(&self, _batch_id: &str) -> Result<LabelPoll, CarrierError> {
            Err(CarrierError::Rejected {
                status: 500,
                body: "carrier down".to_string(),
            })
        }
    }

    #[test]
    fn test_delay_schedule_increases_then_caps() {
        let policy = PollPolicy::default();
        let delays: Vec<u64> = policy.delays().take(8).map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![300, 450, 675, 1012, 1518, 2000, 2000, 2000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_fifth_attempt() {
        let source = ReadyAfter {
            failures: 4,
            calls: AtomicU32::new(0),
        };
        let started = Instant::now();
        let label = poll_for_label(&source, "batch-1", PollPolicy::default())
            .await
            .unwrap()
            .expect("label should be ready on attempt 5");

        assert_eq!(label.0, b"%PDF-label");
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
        // Slept 300 + 450 + 675 + 1012 ms between the five attempts.
        assert_eq!(started.elapsed(), Duration::from_millis(2437));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_not_an_error() {
        let source = ReadyAfter {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let result = poll_for_label(&source, "batch-2", PollPolicy::default())
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hard_failure_aborts_immediately() {
        let started = Instant::now();
        let result = poll_for_label(&AlwaysFailing, "batch-3", PollPolicy::default()).await;
        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
