//! Per-user usage limits for the quiz completion features.
//!
//! Counters are keyed by user, question digest, and feature, with a fixed
//! one-hour window. The check happens before the upstream call: a user at the
//! cap is turned away without consuming the counter or the provider.

use async_trait::async_trait;
use careride_common::{AppError, AppResult};
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Counter window in seconds.
const WINDOW_SECS: i64 = 3600;

/// Quiz feature with its own usage cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizFeature {
    Hint,
    Chat,
    Explain,
}

impl QuizFeature {
    /// Key segment for this feature.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Hint => "hint",
            Self::Chat => "chat",
            Self::Explain => "explain",
        }
    }

    /// Maximum uses per user, per question, per window.
    #[must_use]
    pub const fn max_uses(self) -> u64 {
        match self {
            Self::Hint | Self::Explain => 1,
            Self::Chat => 2,
        }
    }
}

/// Outcome of a usage check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageDecision {
    /// Under the cap; the counter was incremented.
    Allowed { used: u64, limit: u64 },
    /// At the cap; the counter was left untouched.
    LimitReached { limit: u64 },
}

impl UsageDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Backing store for usage counters.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Current counter value, zero when absent or expired.
    async fn get(&self, key: &str) -> AppResult<u64>;

    /// Increment the counter, setting the window expiry on first increment.
    /// Returns the value after the increment.
    async fn incr(&self, key: &str, window_secs: i64) -> AppResult<u64>;
}

/// Redis-backed usage store.
#[derive(Clone)]
pub struct RedisUsageStore {
    redis: Arc<RedisClient>,
}

impl RedisUsageStore {
    /// Create a new Redis usage store.
    #[must_use]
    pub const fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl UsageStore for RedisUsageStore {
    async fn get(&self, key: &str) -> AppResult<u64> {
        let value: Option<u64> = self
            .redis
            .get(key)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(value.unwrap_or(0))
    }

    async fn incr(&self, key: &str, window_secs: i64) -> AppResult<u64> {
        let count: u64 = self
            .redis
            .incr(key)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        // Set expiry on first increment
        if count == 1 {
            self.redis
                .expire::<(), _>(key, window_secs, None)
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
        }

        Ok(count)
    }
}

/// In-memory usage store for tests and single-instance setups. Does not
/// expire entries.
#[derive(Clone, Default)]
pub struct MemoryUsageStore {
    counters: Arc<Mutex<HashMap<String, u64>>>,
}

impl MemoryUsageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn get(&self, key: &str) -> AppResult<u64> {
        let counters = self.counters.lock().await;
        Ok(counters.get(key).copied().unwrap_or(0))
    }

    async fn incr(&self, key: &str, _window_secs: i64) -> AppResult<u64> {
        let mut counters = self.counters.lock().await;
        let count = counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

/// Usage limiter over a counter store.
#[derive(Clone)]
pub struct UsageLimiter {
    store: Arc<dyn UsageStore>,
    prefix: String,
}

impl UsageLimiter {
    /// Create a new usage limiter. `prefix` namespaces the counter keys.
    #[must_use]
    pub fn new(store: Arc<dyn UsageStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Check the cap for (user, question, feature) and consume one use when
    /// under it. The check-then-increment pair is not atomic; a racing pair of
    /// requests can land one use over the cap, which is acceptable here.
    pub async fn check_and_consume(
        &self,
        user_id: &str,
        question: &str,
        feature: QuizFeature,
    ) -> AppResult<UsageDecision> {
        let key = self.counter_key(user_id, question, feature);
        let limit = feature.max_uses();

        let used = self.store.get(&key).await?;
        if used >= limit {
            tracing::debug!(user_id = %user_id, feature = feature.key(), used, limit, "Quiz usage limit reached");
            return Ok(UsageDecision::LimitReached { limit });
        }

        let used = self.store.incr(&key, WINDOW_SECS).await?;
        Ok(UsageDecision::Allowed { used, limit })
    }

    fn counter_key(&self, user_id: &str, question: &str, feature: QuizFeature) -> String {
        let digest = format!("{:x}", md5::compute(question.as_bytes()));
        format!(
            "{}:quiz_usage:{}:{}:{}",
            self.prefix,
            user_id,
            &digest[..12],
            feature.key()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> UsageLimiter {
        UsageLimiter::new(Arc::new(MemoryUsageStore::new()), "test")
    }

    #[tokio::test]
    async fn test_hint_allows_once() {
        let limiter = limiter();

        let first = limiter
            .check_and_consume("u1", "What is 2+2?", QuizFeature::Hint)
            .await
            .unwrap();
        assert_eq!(first, UsageDecision::Allowed { used: 1, limit: 1 });

        let second = limiter
            .check_and_consume("u1", "What is 2+2?", QuizFeature::Hint)
            .await
            .unwrap();
        assert_eq!(second, UsageDecision::LimitReached { limit: 1 });
    }

    #[tokio::test]
    async fn test_chat_allows_twice() {
        let limiter = limiter();

        for used in 1..=2 {
            let decision = limiter
                .check_and_consume("u1", "Capital of France?", QuizFeature::Chat)
                .await
                .unwrap();
            assert_eq!(decision, UsageDecision::Allowed { used, limit: 2 });
        }

        let third = limiter
            .check_and_consume("u1", "Capital of France?", QuizFeature::Chat)
            .await
            .unwrap();
        assert!(!third.is_allowed());
    }

    #[tokio::test]
    async fn test_counters_are_scoped_per_user_and_question() {
        let limiter = limiter();

        limiter
            .check_and_consume("u1", "Q1", QuizFeature::Hint)
            .await
            .unwrap();

        // Different user, same question.
        let other_user = limiter
            .check_and_consume("u2", "Q1", QuizFeature::Hint)
            .await
            .unwrap();
        assert!(other_user.is_allowed());

        // Same user, different question.
        let other_question = limiter
            .check_and_consume("u1", "Q2", QuizFeature::Hint)
            .await
            .unwrap();
        assert!(other_question.is_allowed());

        // Same user, same question, different feature.
        let other_feature = limiter
            .check_and_consume("u1", "Q1", QuizFeature::Explain)
            .await
            .unwrap();
        assert!(other_feature.is_allowed());
    }

    #[tokio::test]
    async fn test_limit_reached_does_not_consume() {
        let store = Arc::new(MemoryUsageStore::new());
        let limiter = UsageLimiter::new(Arc::clone(&store) as Arc<dyn UsageStore>, "test");

        limiter
            .check_and_consume("u1", "Q1", QuizFeature::Hint)
            .await
            .unwrap();
        limiter
            .check_and_consume("u1", "Q1", QuizFeature::Hint)
            .await
            .unwrap();

        let key = limiter.counter_key("u1", "Q1", QuizFeature::Hint);
        assert_eq!(store.get(&key).await.unwrap(), 1);
    }
}
