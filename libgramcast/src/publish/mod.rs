//! Publisher abstraction and implementations
//!
//! The external platform cannot publish a URL in one call: a container is
//! created first and then published, and only the second step yields the
//! durable media id. [`MediaPublisher`] is the seam the reconciler works
//! against; [`GraphPublisher`] is the real client and [`MockPublisher`]
//! backs integration tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::MediaKind;

pub mod graph;

// Mock publisher is available for all builds (not just tests) to support
// integration tests
pub mod mock;

pub use graph::GraphPublisher;
pub use mock::{MockConfig, MockPublisher};

/// Publisher trait for the two-phase media publish protocol
#[async_trait]
pub trait MediaPublisher: Send + Sync {
    /// Publish a media URL with a caption to the given platform account.
    ///
    /// Returns the external media id, the durable proof of publication.
    ///
    /// # Errors
    ///
    /// - `PublishError::NotConfigured` if no access token is available
    ///   (raised before any network call)
    /// - `PublishError::Api` if the platform rejects either protocol step
    /// - `PublishError::Network` on transport failures
    async fn publish(
        &self,
        ig_user_id: &str,
        media_url: &str,
        caption: &str,
        kind: MediaKind,
    ) -> Result<String>;

    /// Lowercase identifier for the publisher implementation
    fn name(&self) -> &str;
}
