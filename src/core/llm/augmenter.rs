use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::failure::{AugmentFailure, FailureReason};
use crate::core::notify::{Notification, NotificationSink};

/// One augmentation request: what was found, and the diagram drawn from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentRequest {
    /// Plain-text analysis summary
    pub summary: String,
    /// Deterministic Mermaid text
    pub diagram: String,
}

/// A generative service that can redraw a diagram
#[async_trait]
pub trait DiagramAugmenter: Send + Sync {
    /// Alternative diagram text in the same description language, or a failure
    async fn augment(&self, request: &AugmentRequest) -> Result<String, AugmentFailure>;

    /// Get the provider name (e.g., "OpenAI", "DeepSeek")
    fn provider_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagramSource {
    Deterministic,
    Augmented,
}

/// What the host receives: always a usable diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AugmentOutcome {
    pub diagram_text: String,
    pub source: DiagramSource,
    /// Set when augmentation was attempted and failed
    pub failure: Option<FailureReason>,
}

impl AugmentOutcome {
    fn deterministic(text: &str, failure: Option<FailureReason>) -> Self {
        Self {
            diagram_text: text.to_string(),
            source: DiagramSource::Deterministic,
            failure,
        }
    }
}

/// Wraps an optional provider with a timeout and the deterministic fallback
pub struct GenerativeAugmenter {
    provider: Option<Box<dyn DiagramAugmenter>>,
    timeout: Duration,
    sink: Arc<dyn NotificationSink>,
}

impl GenerativeAugmenter {
    pub fn new(
        provider: Option<Box<dyn DiagramAugmenter>>,
        timeout: Duration,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            provider,
            timeout,
            sink,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Try the provider once; on any failure or timeout hand back `deterministic`
    /// unchanged and push a classified notification. Never returns an error.
    pub async fn augment_or_fallback(&self, summary: &str, deterministic: &str) -> AugmentOutcome {
        let Some(provider) = &self.provider else {
            debug!("Augmentation disabled, using deterministic diagram");
            return AugmentOutcome::deterministic(deterministic, None);
        };

        let request = AugmentRequest {
            summary: summary.to_string(),
            diagram: deterministic.to_string(),
        };

        info!("Requesting augmented diagram from {}", provider.provider_name());
        let attempt = match tokio::time::timeout(self.timeout, provider.augment(&request)).await {
            Ok(result) => result.and_then(|text| validate_diagram(&text)),
            Err(_) => Err(AugmentFailure::generic(format!(
                "no response within {}ms",
                self.timeout.as_millis()
            ))),
        };

        match attempt {
            Ok(text) => AugmentOutcome {
                diagram_text: text,
                source: DiagramSource::Augmented,
                failure: None,
            },
            Err(failure) => {
                warn!("Augmentation failed, falling back: {}", failure);
                self.sink.notify(Notification::new(
                    failure.reason,
                    provider.provider_name(),
                    &failure.message,
                ));
                AugmentOutcome::deterministic(deterministic, Some(failure.reason))
            }
        }
    }
}

/// Strip Markdown fences and require a flowchart header
pub fn validate_diagram(response: &str) -> Result<String, AugmentFailure> {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string (`mermaid`) on the fence line
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        text = text.trim_end();
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    if text.starts_with("flowchart") || text.starts_with("graph") {
        Ok(format!("{}\n", text))
    } else {
        Err(AugmentFailure::generic("response is not a flowchart description"))
    }
}
