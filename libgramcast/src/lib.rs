//! Gramcast - scheduled publishing for Instagram-style media APIs
//!
//! This library provides the core of the scheduled-publish pipeline:
//! the post store, per-owner credential resolution, the two-phase
//! Graph API publisher, and the reconciler that drives due posts to a
//! terminal status.

pub mod config;
pub mod connections;
pub mod db;
pub mod error;
pub mod logging;
pub mod publish;
pub mod reconciler;
pub mod scheduling;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use connections::ConnectionResolver;
pub use db::Database;
pub use error::{GramcastError, PublishError, Result};
pub use publish::{GraphPublisher, MediaPublisher};
pub use reconciler::{Reconciler, TickOutcome};
pub use types::{InstagramConnection, MediaKind, PostStatus, ScheduledPost};
