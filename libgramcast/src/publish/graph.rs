//! Graph API client implementing the two-phase publish protocol
//!
//! Step one creates a media container from the caption and the typed media
//! URL; step two publishes the container and returns the external media id.
//! A failure at either step aborts the whole operation — there is no
//! container-level recovery, the next cycle simply starts a fresh container.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::{PublishError, Result};
use crate::publish::MediaPublisher;
use crate::types::MediaKind;

/// Request body for the container-create endpoint
#[derive(Debug, Serialize)]
struct ContainerRequest<'a> {
    access_token: &'a str,
    caption: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<&'a str>,
    /// Discriminator the platform requires for video containers
    #[serde(skip_serializing_if = "Option::is_none")]
    media_type: Option<&'static str>,
}

/// Request body for the container-publish endpoint
#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    access_token: &'a str,
    creation_id: &'a str,
}

/// Both endpoints answer with an opaque id on success
#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: String,
}

/// Error envelope the platform nests its diagnostic message in
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP publisher for the Graph API
#[derive(Debug, Clone)]
pub struct GraphPublisher {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl GraphPublisher {
    /// Create a publisher with an explicit endpoint and token
    pub fn new(api_base: String, access_token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PublishError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Create a publisher from configuration, resolving the access token once.
    ///
    /// An unresolvable token does not fail construction; publish attempts
    /// raise the distinct not-configured error instead, so the daemon can
    /// keep running and surface the condition per tick.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.resolve_access_token();
        Self::new(config.instagram.api_base.clone(), token)
    }

    async fn post_json<T: Serialize>(&self, url: &str, body: &T) -> Result<String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let media: MediaResponse = response
                .json()
                .await
                .map_err(|e| PublishError::Api(format!("unexpected response body: {e}")))?;
            return Ok(media.id);
        }

        // Prefer the platform's nested diagnostic message over the raw body
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => api_err.error.message,
            Err(_) => format!("API returned {status}: {body}"),
        };
        Err(PublishError::Api(message).into())
    }

    async fn create_container(
        &self,
        ig_user_id: &str,
        media_url: &str,
        caption: &str,
        kind: MediaKind,
    ) -> Result<String> {
        let request = match kind {
            MediaKind::Image => ContainerRequest {
                access_token: &self.access_token,
                caption,
                image_url: Some(media_url),
                video_url: None,
                media_type: None,
            },
            MediaKind::Video => ContainerRequest {
                access_token: &self.access_token,
                caption,
                image_url: None,
                video_url: Some(media_url),
                media_type: Some("VIDEO"),
            },
        };

        let url = format!("{}/{}/media", self.api_base, ig_user_id);
        self.post_json(&url, &request).await
    }

    async fn publish_container(&self, ig_user_id: &str, container_id: &str) -> Result<String> {
        let request = PublishRequest {
            access_token: &self.access_token,
            creation_id: container_id,
        };

        let url = format!("{}/{}/media_publish", self.api_base, ig_user_id);
        self.post_json(&url, &request).await
    }
}

#[async_trait]
impl MediaPublisher for GraphPublisher {
    async fn publish(
        &self,
        ig_user_id: &str,
        media_url: &str,
        caption: &str,
        kind: MediaKind,
    ) -> Result<String> {
        if self.access_token.is_empty() {
            return Err(PublishError::NotConfigured.into());
        }

        let container_id = self
            .create_container(ig_user_id, media_url, caption, kind)
            .await?;
        debug!(ig_user_id, container_id, "media container created");

        self.publish_container(ig_user_id, &container_id).await
    }

    fn name(&self) -> &str {
        "instagram"
    }
}
