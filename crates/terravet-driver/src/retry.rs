use std::time::Duration;

// ── Policy ────────────────────────────────────────────────────────────────────

/// One (pattern, retryable) entry, matched as a substring of the
/// stringified backend error. First match wins, so deny entries can be
/// placed ahead of broader allow entries.
#[derive(Debug, Clone)]
pub struct RetryRule {
    pub pattern: String,
    pub retryable: bool,
}

impl RetryRule {
    pub fn retryable(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), retryable: true }
    }

    pub fn fatal(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), retryable: false }
    }
}

/// Transient-error policy for `apply()`. Statically defined so it can be
/// unit-tested without any live backend.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    rules: Vec<RetryRule>,
}

impl RetryPolicy {
    /// Single attempt, no matching — every error is fatal.
    pub fn none() -> Self {
        Self { max_attempts: 1, backoff: Duration::ZERO, rules: Vec::new() }
    }

    pub fn new(max_attempts: u32, backoff: Duration, rules: Vec<RetryRule>) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff, rules }
    }

    /// The transient backend errors worth re-attempting against Azure.
    /// Everything not listed propagates immediately as fatal.
    pub fn default_retryable_errors() -> Self {
        let rules = vec![
            RetryRule::retryable("TLS handshake timeout"),
            RetryRule::retryable("connection reset by peer"),
            RetryRule::retryable("unexpected EOF"),
            RetryRule::retryable("timeout while waiting for state"),
            RetryRule::retryable("429"),
            RetryRule::retryable("TooManyRequests"),
            RetryRule::retryable("RetryableError"),
            RetryRule::retryable("AnotherOperationInProgress"),
            RetryRule::retryable("Please try again"),
        ];
        Self::new(3, Duration::from_secs(10), rules)
    }

    /// First rule whose pattern occurs in `error_text`, if any.
    pub fn matching_rule(&self, error_text: &str) -> Option<&RetryRule> {
        self.rules.iter().find(|r| error_text.contains(&r.pattern))
    }

    /// Whether attempt `attempt` (1-based) failing with `error_text`
    /// should be re-run, and after how long.
    pub fn next_delay(&self, attempt: u32, error_text: &str) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        match self.matching_rule(error_text) {
            Some(rule) if rule.retryable => Some(self.backoff),
            _ => None,
        }
    }
}
