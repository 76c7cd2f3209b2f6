use std::fmt;
use serde::{Deserialize, Serialize};

/// Why a generative request failed, as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    InsufficientCredit,
    RateLimit,
    Authentication,
    QuotaExceeded,
    Generic,
}

impl FailureReason {
    /// Classify from the HTTP status (when there was a response) and the error text
    pub fn classify(status: Option<u16>, message: &str) -> Self {
        let message = message.to_lowercase();
        let mentions = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

        if status == Some(402)
            || mentions(&["insufficient balance", "insufficient credit", "credit balance", "payment required"])
        {
            FailureReason::InsufficientCredit
        } else if matches!(status, Some(401) | Some(403))
            || mentions(&["invalid api key", "incorrect api key", "invalid_api_key", "unauthorized", "authentication"])
        {
            FailureReason::Authentication
        } else if mentions(&["quota", "billing"]) {
            // Checked before rate limits: quota exhaustion is also reported as 429
            FailureReason::QuotaExceeded
        } else if status == Some(429) || mentions(&["rate limit", "rate_limit", "too many requests"]) {
            FailureReason::RateLimit
        } else {
            FailureReason::Generic
        }
    }

    /// User-facing advice for this failure class
    pub fn remediation(&self) -> &'static str {
        match self {
            FailureReason::InsufficientCredit => {
                "The generative service account has insufficient balance. Add credit or disable augmentation."
            }
            FailureReason::RateLimit => {
                "The generative service is rate limiting requests. Wait a moment and try again."
            }
            FailureReason::Authentication => {
                "The API key was rejected. Check augmentation.api_key or the ARCHFLOW_API_KEY variable."
            }
            FailureReason::QuotaExceeded => {
                "The usage quota for the generative service is exhausted. Review the plan limits."
            }
            FailureReason::Generic => {
                "The generative service request failed. The deterministic diagram is shown instead."
            }
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::InsufficientCredit => "insufficient-credit",
            FailureReason::RateLimit => "rate-limit",
            FailureReason::Authentication => "authentication",
            FailureReason::QuotaExceeded => "quota-exceeded",
            FailureReason::Generic => "generic",
        };
        f.write_str(text)
    }
}

/// A failed augmentation attempt
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {message}")]
pub struct AugmentFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl AugmentFailure {
    pub fn from_response(status: u16, body: &str) -> Self {
        Self {
            reason: FailureReason::classify(Some(status), body),
            message: format!("HTTP {}: {}", status, body.trim()),
        }
    }

    /// Transport errors and anything without a response
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            reason: FailureReason::classify(None, &message),
            message,
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            reason: FailureReason::Generic,
            message: message.into(),
        }
    }
}
