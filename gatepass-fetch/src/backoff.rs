//! Attempt budget, cooldowns, and the injected clock.
//!
//! All sleeps in the retry loop go through [`Clock`], so tests can substitute
//! a zero-delay fake and assert attempt counts without wall-clock cost.

use async_trait::async_trait;
use std::time::Duration;

/// Maximum attempts for one logical fetch. The counter starts at 1 and the
/// loop runs while no terminal response was produced and the counter is
/// within budget, so exactly 11 attempts are made before exhaustion.
pub const MAX_ATTEMPTS: u32 = 11;

// ============================================================================
// Clock
// ============================================================================

/// Waitable clock abstraction.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Blocks the current task for the given duration.
    async fn wait(&self, duration: Duration);
}

/// Production clock backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Backoff Policy
// ============================================================================

/// Fixed cooldown windows between attempts.
///
/// These are flat pauses, not exponential backoff: the observed servers
/// rotate rate limits on fixed windows, so the loop sleeps a constant time
/// per condition regardless of the attempt count.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Pause after a generic non-success status.
    pub short: Duration,
    /// Pause after a failed challenge remediation.
    pub challenge: Duration,
    /// Pause after a 429 rate-limit response.
    pub rate_limit: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(1),
            challenge: Duration::from_secs(30),
            rate_limit: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// A policy with all cooldowns set to zero, for tests.
    pub fn zero() -> Self {
        Self {
            short: Duration::ZERO,
            challenge: Duration::ZERO,
            rate_limit: Duration::ZERO,
        }
    }

    /// Overrides the short cooldown.
    pub fn with_short(mut self, duration: Duration) -> Self {
        self.short = duration;
        self
    }

    /// Overrides the challenge cooldown.
    pub fn with_challenge(mut self, duration: Duration) -> Self {
        self.challenge = duration;
        self
    }

    /// Overrides the rate-limit cooldown.
    pub fn with_rate_limit(mut self, duration: Duration) -> Self {
        self.rate_limit = duration;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.short, Duration::from_secs(1));
        assert_eq!(policy.challenge, Duration::from_secs(30));
        assert_eq!(policy.rate_limit, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_overrides() {
        let policy = BackoffPolicy::zero().with_rate_limit(Duration::from_secs(5));
        assert_eq!(policy.rate_limit, Duration::from_secs(5));
        assert_eq!(policy.short, Duration::ZERO);
    }
}
