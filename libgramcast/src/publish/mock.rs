//! Mock publisher implementation for testing
//!
//! Provides a configurable publisher that can simulate successes, platform
//! rejections, missing configuration, and network latency. Designed for
//! integration tests that exercise the reconciler without real credentials
//! or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{PublishError, Result};
use crate::publish::MediaPublisher;
use crate::types::MediaKind;

/// One captured publish call, for verification
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRequest {
    pub ig_user_id: String,
    pub media_url: String,
    pub caption: String,
    pub kind: MediaKind,
}

/// Configuration for mock publisher behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Publisher name
    pub name: String,

    /// Whether publishing should succeed
    pub publish_succeeds: bool,

    /// Error to return on publish failure
    pub publish_error: Option<PublishError>,

    /// Delay before completing operations (simulates network latency)
    pub delay: Duration,

    /// Number of times publish has been called
    pub call_count: Arc<Mutex<usize>>,

    /// Requests that have been published (for verification)
    pub published: Arc<Mutex<Vec<PublishedRequest>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            publish_succeeds: true,
            publish_error: None,
            delay: Duration::from_millis(0),
            call_count: Arc::new(Mutex::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock publisher for testing
pub struct MockPublisher {
    config: MockConfig,
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock publisher that always succeeds
    pub fn success() -> Self {
        Self::new(MockConfig::default())
    }

    /// Create a mock publisher whose publish step is rejected by the platform
    pub fn api_failure(message: &str) -> Self {
        Self::new(MockConfig {
            publish_succeeds: false,
            publish_error: Some(PublishError::Api(message.to_string())),
            ..Default::default()
        })
    }

    /// Create a mock publisher that fails with a transport error
    pub fn network_failure(message: &str) -> Self {
        Self::new(MockConfig {
            publish_succeeds: false,
            publish_error: Some(PublishError::Network(message.to_string())),
            ..Default::default()
        })
    }

    /// Create a mock publisher with no access token configured
    pub fn not_configured() -> Self {
        Self::new(MockConfig {
            publish_succeeds: false,
            publish_error: Some(PublishError::NotConfigured),
            ..Default::default()
        })
    }

    /// Create a mock publisher with a delay
    pub fn with_delay(delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..Default::default()
        })
    }

    /// Get the number of times publish was called
    pub fn call_count(&self) -> usize {
        *self.config.call_count.lock().unwrap()
    }

    /// Get all requests that were published
    pub fn published(&self) -> Vec<PublishedRequest> {
        self.config.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaPublisher for MockPublisher {
    async fn publish(
        &self,
        ig_user_id: &str,
        media_url: &str,
        caption: &str,
        kind: MediaKind,
    ) -> Result<String> {
        *self.config.call_count.lock().unwrap() += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.publish_succeeds {
            self.config
                .published
                .lock()
                .unwrap()
                .push(PublishedRequest {
                    ig_user_id: ig_user_id.to_string(),
                    media_url: media_url.to_string(),
                    caption: caption.to_string(),
                    kind,
                });

            Ok(format!("{}:media-{}", self.config.name, uuid::Uuid::new_v4()))
        } else {
            let error = self
                .config
                .publish_error
                .clone()
                .unwrap_or_else(|| PublishError::Api("Mock publish failed".to_string()));
            Err(error.into())
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
