//! Admission control for model requests.
//!
//! A single [`AdmissionGate`] is created at startup and shared (via `Arc`)
//! by every run in the process. It is a token bucket: one token accrues per
//! `min_interval`, at most `burst` tokens are held, and each model request
//! spends one. Callers that find the bucket empty wait their turn instead of
//! failing; waiters are admitted in the order they arrived.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Admission gate settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Minimum spacing between admitted requests; zero disables the gate
    #[serde(with = "duration_millis")]
    pub min_interval: Duration,
    /// Maximum number of tokens the bucket can hold
    pub burst: u32,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            burst: 30,
        }
    }
}

impl AdmissionConfig {
    /// A configuration that admits every request immediately
    pub fn unlimited() -> Self {
        Self {
            min_interval: Duration::ZERO,
            burst: 1,
        }
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant, config: &AdmissionConfig) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let earned = elapsed.as_secs_f64() / config.min_interval.as_secs_f64();
        self.tokens = (self.tokens + earned).min(config.burst.max(1) as f64);
        self.last_refill = now;
    }
}

/// Process-wide rate gate consulted before every reasoning call.
#[derive(Debug)]
pub struct AdmissionGate {
    config: AdmissionConfig,
    // tokio's Mutex hands out the lock in FIFO order, which gives fair,
    // request-ordered admission across concurrent runs.
    bucket: Mutex<Bucket>,
}

impl AdmissionGate {
    /// Create a gate whose bucket starts empty
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            bucket: Mutex::new(Bucket {
                tokens: 0.0,
                last_refill: Instant::now(),
            }),
        }
    }

    /// A gate that never delays
    pub fn unlimited() -> Self {
        Self::new(AdmissionConfig::unlimited())
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Wait until a request may be sent, then spend one token.
    pub async fn admit(&self) {
        if self.config.min_interval.is_zero() {
            return;
        }

        let mut bucket = self.bucket.lock().await;
        loop {
            bucket.refill(Instant::now(), &self.config);
            if bucket.tokens >= 1.0 {
                bucket.tokens -= 1.0;
                return;
            }
            let wait = self.config.min_interval.mul_f64(1.0 - bucket.tokens);
            tracing::trace!(?wait, "admission gate waiting for a token");
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(AdmissionConfig::default())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn config(interval_ms: u64, burst: u32) -> AdmissionConfig {
        AdmissionConfig {
            min_interval: Duration::from_millis(interval_ms),
            burst,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_waits_one_interval() {
        let gate = AdmissionGate::new(config(1000, 30));
        let start = Instant::now();
        gate.admit().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_spaced_by_interval() {
        let gate = AdmissionGate::new(config(1000, 30));
        let start = Instant::now();
        for _ in 0..3 {
            gate.admit().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_allowance_after_idle() {
        let gate = AdmissionGate::new(config(1000, 5));
        tokio::time::sleep(Duration::from_secs(60)).await;

        let start = Instant::now();
        for _ in 0..5 {
            gate.admit().await;
        }
        // Bucket was capped at 5 tokens, all spent without waiting
        assert_eq!(start.elapsed(), Duration::ZERO);

        gate.admit().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_admitted_in_arrival_order() {
        let gate = Arc::new(AdmissionGate::new(config(100, 1)));
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let gate = Arc::clone(&gate);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                gate.admit().await;
                order.lock().await.push(i);
            }));
            // Let the task reach the gate before spawning the next one
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().await, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unlimited_gate_never_waits() {
        let gate = AdmissionGate::unlimited();
        let start = std::time::Instant::now();
        for _ in 0..100 {
            gate.admit().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_config_serde_millis() {
        let cfg: AdmissionConfig =
            serde_json::from_str(r#"{"min_interval": 500, "burst": 10}"#).unwrap();
        assert_eq!(cfg, config(500, 10));
    }
}
