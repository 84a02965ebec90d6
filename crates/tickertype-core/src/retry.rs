//! Retry policy for transient listing fetch failures.

use std::time::Duration;

use crate::ValidationError;

/// Ceiling for the exponential strategy when it is picked by name.
pub const EXPONENTIAL_CEILING: Duration = Duration::from_secs(300);

/// How long to wait before trying the same page again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same pause before every retry.
    Fixed { delay: Duration },
    /// `base * factor^attempt`, clamped to `max`. With `jitter` the clamped
    /// delay is scaled by a random factor in `[0.5, 1.5)`.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Fixed {
            delay: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    /// Build a strategy from its name (`fixed` or `exponential`) around `delay`.
    ///
    /// `exponential` starts at `delay`, doubles each retry, stops growing at
    /// [`EXPONENTIAL_CEILING`] and is jittered.
    pub fn named(name: &str, delay: Duration) -> Result<Self, ValidationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed { delay }),
            "exponential" => Ok(Self::Exponential {
                base: delay,
                factor: 2.0,
                max: EXPONENTIAL_CEILING.max(delay),
                jitter: true,
            }),
            other => Err(ValidationError::InvalidPolicy {
                value: other.to_owned(),
                expected: "fixed, exponential",
            }),
        }
    }

    /// Pause before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let growth = factor.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
                let clamped = (base.as_secs_f64() * growth).min(max.as_secs_f64());
                let scale = if jitter { 0.5 + fastrand::f64() } else { 1.0 };
                Duration::from_secs_f64(clamped * scale)
            }
        }
    }
}

/// Retry configuration for a single page.
///
/// Transport errors are always retried. `max_retries: None` means the same page
/// is retried until it succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Upper bound on retries per page. Total attempts = `max_retries + 1`.
    pub max_retries: Option<u32>,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
    /// HTTP status codes that trigger a backoff and retry of the same page.
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: None,
            backoff: Backoff::default(),
            retry_on_status: vec![429],
        }
    }
}

impl RetryConfig {
    /// Fixed delay, retried without a ceiling.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed { delay },
            ..Self::default()
        }
    }

    /// Cap the number of retries per page.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Whether another attempt is allowed after `retries` retries already spent.
    pub fn allows_retry(&self, retries: u32) -> bool {
        self.max_retries.map_or(true, |max| retries < max)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}
