// session-coordinator/src/retry.rs
use common::SessionConfig;
use std::time::{Duration, Instant};

use crate::error::IdentityError;

/// How a failed verification is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Connectivity or service availability; retried, never signs out
    Transient,
    /// The credential itself was rejected (401/403)
    Fatal,
}

/// One logical round trip to the identity service, retries included
#[derive(Debug, Clone)]
pub struct VerificationAttempt {
    pub credential: String,
    pub started_at: Instant,
    pub retry_count: u32,
    pub classification: Option<FailureClass>,
}

impl VerificationAttempt {
    pub fn new(credential: String) -> Self {
        Self {
            credential,
            started_at: Instant::now(),
            retry_count: 0,
            classification: None,
        }
    }
}

/// Fixed-delay, bounded retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(2000))
    }
}

impl From<&SessionConfig> for RetryPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn classify(&self, error: &IdentityError) -> FailureClass {
        match error.status() {
            Some(401) | Some(403) => FailureClass::Fatal,
            // Network, timeout, 5xx, malformed bodies: keep the credential
            _ => FailureClass::Transient,
        }
    }

    pub fn should_retry(&self, attempt: &VerificationAttempt) -> bool {
        attempt.classification == Some(FailureClass::Transient) && attempt.retry_count < self.max_retries
    }

    pub fn delay_before_retry(&self, _attempt: &VerificationAttempt) -> Duration {
        self.delay
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::DecodeError;

    fn failed(class: FailureClass, retry_count: u32) -> VerificationAttempt {
        let mut attempt = VerificationAttempt::new("cred".to_string());
        attempt.classification = Some(class);
        attempt.retry_count = retry_count;
        attempt
    }

    #[test]
    fn test_auth_statuses_are_fatal() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.classify(&IdentityError::Status { code: 401 }), FailureClass::Fatal);
        assert_eq!(policy.classify(&IdentityError::Status { code: 403 }), FailureClass::Fatal);
    }

    #[test]
    fn test_everything_else_is_transient() {
        let policy = RetryPolicy::default();
        let errors = [
            IdentityError::Network("connection refused".to_string()),
            IdentityError::Timeout,
            IdentityError::Status { code: 500 },
            IdentityError::Status { code: 503 },
            IdentityError::Status { code: 404 },
            IdentityError::Decode(DecodeError::MissingProfile),
        ];
        for error in &errors {
            assert_eq!(policy.classify(error), FailureClass::Transient, "{}", error);
        }
    }

    #[test]
    fn test_at_most_two_retries() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(&failed(FailureClass::Transient, 0)));
        assert!(policy.should_retry(&failed(FailureClass::Transient, 1)));
        assert!(!policy.should_retry(&failed(FailureClass::Transient, 2)));
    }

    #[test]
    fn test_fatal_never_retries() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&failed(FailureClass::Fatal, 0)));
    }

    #[test]
    fn test_unclassified_attempt_does_not_retry() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(&VerificationAttempt::new("cred".to_string())));
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before_retry(&failed(FailureClass::Transient, 0)), Duration::from_secs(2));
        assert_eq!(policy.delay_before_retry(&failed(FailureClass::Transient, 1)), Duration::from_secs(2));
    }

    #[test]
    fn test_from_session_config() {
        let config = SessionConfig {
            max_retries: 1,
            retry_delay_ms: 5,
            ..SessionConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries(), 1);
        assert_eq!(policy.delay_before_retry(&failed(FailureClass::Transient, 0)), Duration::from_millis(5));
    }
}
