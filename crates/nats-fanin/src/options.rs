//! Per-request options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::RequestError;

/// Default number of replies to wait for.
pub const DEFAULT_EXPECTED: usize = 1;

/// Default wait window.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// How many replies to wait for, for how long, and what a short batch means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Target reply count
    pub expected: usize,
    /// Wait window, serialized as `timeout_ms`
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// Fail with `Timeout` instead of returning a partial batch
    pub error_if_partial: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            expected: DEFAULT_EXPECTED,
            timeout: DEFAULT_TIMEOUT,
            error_if_partial: false,
        }
    }
}

impl RequestOptions {
    /// Options with a given target reply count.
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            ..Default::default()
        }
    }

    /// Set the target reply count.
    pub fn expected(mut self, expected: usize) -> Self {
        self.expected = expected;
        self
    }

    /// Set the wait window.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Choose whether a partial batch is an error.
    pub fn error_if_partial(mut self, strict: bool) -> Self {
        self.error_if_partial = strict;
        self
    }

    /// Check the options before any I/O is attempted.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.expected == 0 {
            return Err(RequestError::InvalidArgument(
                "expected must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse options from JSON, e.g. `{"expected": 3, "timeout_ms": 250}`.
    ///
    /// Missing fields take their defaults. A negative or fractional
    /// `expected` is rejected like a zero one.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| RequestError::InvalidArgument(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
