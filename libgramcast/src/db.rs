//! Database operations for Gramcast

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;

use crate::error::Result;
use crate::types::{InstagramConnection, MediaKind, PostStatus, ScheduledPost};

/// Per-status counts for the queue
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct QueueStats {
    pub pending: i64,
    pub published: i64,
    pub failed: i64,
}

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::DbError::IoError)?;
        }

        // Use forward slashes for SQLite URL (works on both Windows and Unix)
        // Use mode=rwc to allow creating the database file if it doesn't exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(crate::error::DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Open an in-memory database (tests)
    ///
    /// Pinned to a single pooled connection: every pooled connection to
    /// `sqlite::memory:` would otherwise get its own private database.
    pub async fn in_memory() -> Result<Self> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(crate::error::DbError::MigrationError)?;

        Ok(Self { pool })
    }

    fn post_from_row(r: &sqlx::sqlite::SqliteRow) -> ScheduledPost {
        ScheduledPost {
            id: r.get("id"),
            owner_id: r.get("owner_id"),
            caption: r.get("caption"),
            media_url: r.get("media_url"),
            media_kind: match r.get::<String, _>("media_kind").as_str() {
                "video" => MediaKind::Video,
                _ => MediaKind::Image,
            },
            scheduled_at: r.get("scheduled_at"),
            status: match r.get::<String, _>("status").as_str() {
                "published" => PostStatus::Published,
                "failed" => PostStatus::Failed,
                _ => PostStatus::Pending,
            },
            error_message: r.get("error_message"),
            published_at: r.get("published_at"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }

    /// Create a new scheduled post
    pub async fn create_post(&self, post: &ScheduledPost) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, owner_id, caption, media_url, media_kind, scheduled_at,
                               status, error_message, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.owner_id)
        .bind(&post.caption)
        .bind(&post.media_url)
        .bind(post.media_kind.as_str())
        .bind(post.scheduled_at)
        .bind(post.status.as_str())
        .bind(&post.error_message)
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(())
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: &str) -> Result<Option<ScheduledPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, caption, media_url, media_kind, scheduled_at,
                   status, error_message, published_at, created_at, updated_at
            FROM posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(row.map(|r| Self::post_from_row(&r)))
    }

    /// Posts eligible to publish: still pending and scheduled at or before `now`.
    ///
    /// This is a snapshot at call time; posts becoming due while a tick is
    /// in flight are picked up by the next tick.
    pub async fn due_posts(&self, now: i64) -> Result<Vec<ScheduledPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, caption, media_url, media_kind, scheduled_at,
                   status, error_message, published_at, created_at, updated_at
            FROM posts
            WHERE status = 'pending' AND scheduled_at <= ?
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows.iter().map(Self::post_from_row).collect())
    }

    /// Record a successful publish
    pub async fn mark_published(&self, post_id: &str, now: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET status = 'published', published_at = ?, error_message = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(())
    }

    /// Record a failed publish attempt
    pub async fn mark_failed(&self, post_id: &str, error_message: &str, now: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET status = 'failed', error_message = ?, published_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(error_message)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(())
    }

    /// Move a pending post to a new scheduled time.
    ///
    /// Published and failed posts are terminal for the pipeline; returns
    /// false when the post is missing or no longer pending.
    pub async fn reschedule_post(&self, post_id: &str, scheduled_at: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE posts SET scheduled_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(scheduled_at)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a post (user cancellation). Returns false if it did not exist.
    pub async fn delete_post(&self, post_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all pending posts, returning how many were removed
    pub async fn delete_pending_posts(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM posts WHERE status = 'pending'")
            .execute(&self.pool)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        Ok(result.rows_affected())
    }

    /// List posts ordered by scheduled time, optionally filtered
    pub async fn list_posts(
        &self,
        owner: Option<&str>,
        status: Option<PostStatus>,
        limit: usize,
    ) -> Result<Vec<ScheduledPost>> {
        let mut where_clauses = vec!["1=1"];

        if owner.is_some() {
            where_clauses.push("owner_id = ?");
        }
        if status.is_some() {
            where_clauses.push("status = ?");
        }

        let query_str = format!(
            r#"
            SELECT id, owner_id, caption, media_url, media_kind, scheduled_at,
                   status, error_message, published_at, created_at, updated_at
            FROM posts
            WHERE {}
            ORDER BY scheduled_at ASC
            LIMIT ?
            "#,
            where_clauses.join(" AND ")
        );

        let mut query = sqlx::query(&query_str);
        if let Some(owner) = owner {
            query = query.bind(owner);
        }
        if let Some(status) = status {
            query = query.bind(status.as_str());
        }
        query = query.bind(limit as i64);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows.iter().map(Self::post_from_row).collect())
    }

    /// Per-status counts across the whole queue
    pub async fn queue_stats(&self) -> Result<QueueStats> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS n FROM posts GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        let mut stats = QueueStats::default();
        for row in rows {
            let count: i64 = row.get("n");
            match row.get::<String, _>("status").as_str() {
                "pending" => stats.pending = count,
                "published" => stats.published = count,
                "failed" => stats.failed = count,
                _ => {}
            }
        }

        Ok(stats)
    }

    // ========================================================================
    // Connections
    // ========================================================================

    fn connection_from_row(r: &sqlx::sqlite::SqliteRow) -> InstagramConnection {
        InstagramConnection {
            id: r.get("id"),
            owner_id: r.get("owner_id"),
            ig_user_id: r.get("ig_user_id"),
            username: r.get("username"),
            access_token: r.get("access_token"),
            connected_at: r.get("connected_at"),
        }
    }

    /// Insert or replace a connection record
    pub async fn upsert_connection(&self, conn: &InstagramConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO connections (id, owner_id, ig_user_id, username, access_token, connected_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                ig_user_id = excluded.ig_user_id,
                username = excluded.username,
                access_token = excluded.access_token,
                connected_at = excluded.connected_at
            "#,
        )
        .bind(&conn.id)
        .bind(&conn.owner_id)
        .bind(&conn.ig_user_id)
        .bind(&conn.username)
        .bind(&conn.access_token)
        .bind(conn.connected_at)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(())
    }

    /// Primary-key lookup: record id equal to the owner id (current keying)
    pub async fn get_connection(&self, id: &str) -> Result<Option<InstagramConnection>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, ig_user_id, username, access_token, connected_at
            FROM connections WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(row.map(|r| Self::connection_from_row(&r)))
    }

    /// Field query fallback: legacy records keyed by an arbitrary id
    pub async fn find_connection_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<Option<InstagramConnection>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, ig_user_id, username, access_token, connected_at
            FROM connections WHERE owner_id = ?
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(row.map(|r| Self::connection_from_row(&r)))
    }

    /// List every connection, newest first
    pub async fn list_connections(&self) -> Result<Vec<InstagramConnection>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, ig_user_id, username, access_token, connected_at
            FROM connections
            ORDER BY connected_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows.iter().map(Self::connection_from_row).collect())
    }

    /// Remove the connection(s) belonging to an owner
    pub async fn delete_connection(&self, owner_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM connections WHERE id = ? OR owner_id = ?")
            .bind(owner_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }
}
