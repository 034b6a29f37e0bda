//! Per-tick reconciliation of due posts
//!
//! Each tick selects the pending posts whose scheduled time has arrived,
//! then drives every one of them to a terminal status: resolve the owner's
//! connection, run the two-phase publish, and write the outcome back.
//! Posts are independent, so the per-post work runs as concurrent tasks and
//! one post's failure never aborts the batch.

use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::connections::ConnectionResolver;
use crate::db::Database;
use crate::error::Result;
use crate::publish::MediaPublisher;
use crate::types::ScheduledPost;

/// Run-level summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Posts selected as due at the start of the tick
    pub selected: usize,
    /// Posts that reached `published`
    pub published: usize,
    /// Posts that reached `failed`
    pub failed: usize,
}

enum PostOutcome {
    Published,
    Failed,
}

pub struct Reconciler {
    db: Database,
    resolver: ConnectionResolver,
    publisher: Arc<dyn MediaPublisher>,
    max_concurrent: Option<usize>,
}

impl Reconciler {
    pub fn new(db: Database, publisher: Arc<dyn MediaPublisher>) -> Self {
        let resolver = ConnectionResolver::new(db.clone());
        Self {
            db,
            resolver,
            publisher,
            max_concurrent: None,
        }
    }

    /// Cap concurrent per-post publish tasks. Unbounded by default; the
    /// bound is a configuration decision, not an accident of the code.
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Run one tick at the current wall-clock time
    pub async fn run_tick(&self) -> Result<TickOutcome> {
        self.run_tick_at(chrono::Utc::now().timestamp()).await
    }

    /// Run one tick with an explicit `now` (the tick's captured instant)
    ///
    /// Only the due-post query itself can fail out of this function; every
    /// per-post error is converted into that post's `failed` transition.
    pub async fn run_tick_at(&self, now: i64) -> Result<TickOutcome> {
        let due = self.db.due_posts(now).await?;

        if due.is_empty() {
            return Ok(TickOutcome::default());
        }

        info!("Found {} post(s) due for publishing", due.len());
        let selected = due.len();

        let tasks = due.into_iter().map(|post| self.process_post(post, now));

        let results: Vec<PostOutcome> = match self.max_concurrent {
            Some(limit) => stream::iter(tasks).buffer_unordered(limit).collect().await,
            None => join_all(tasks).await,
        };

        let published = results
            .iter()
            .filter(|o| matches!(o, PostOutcome::Published))
            .count();

        Ok(TickOutcome {
            selected,
            published,
            failed: selected - published,
        })
    }

    /// Drive a single post to a terminal status.
    ///
    /// Never returns an error: failures become the post's `failed`
    /// transition, and a store write failure while recording an outcome is
    /// logged without disturbing the rest of the batch.
    async fn process_post(&self, post: ScheduledPost, now: i64) -> PostOutcome {
        info!(post_id = %post.id, owner_id = %post.owner_id, "publishing scheduled post");

        match self.publish_post(&post).await {
            Ok(media_id) => {
                info!(post_id = %post.id, media_id = %media_id, "published");
                if let Err(e) = self.db.mark_published(&post.id, now).await {
                    warn!(post_id = %post.id, "failed to record publish outcome: {}", e);
                }
                PostOutcome::Published
            }
            Err(e) => {
                let message = e.failure_message();
                warn!(post_id = %post.id, error = %message, "publish failed");
                if let Err(e) = self.db.mark_failed(&post.id, &message, now).await {
                    warn!(post_id = %post.id, "failed to record failure outcome: {}", e);
                }
                PostOutcome::Failed
            }
        }
    }

    async fn publish_post(&self, post: &ScheduledPost) -> Result<String> {
        let connection = self.resolver.resolve(&post.owner_id).await?;

        self.publisher
            .publish(
                &connection.ig_user_id,
                &post.media_url,
                &post.caption,
                post.media_kind,
            )
            .await
    }
}
