//! Per-owner credential resolution
//!
//! Connection records have been keyed two ways over time: the current
//! connect flow stores them under the owner id, while older records carry
//! an arbitrary id and only reference the owner through the `owner_id`
//! column. Resolution therefore tries the primary key first and falls back
//! to a field query.

use tracing::debug;

use crate::db::Database;
use crate::error::{PublishError, Result};
use crate::types::InstagramConnection;

#[derive(Clone)]
pub struct ConnectionResolver {
    db: Database,
}

impl ConnectionResolver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolve the publishing connection for an owner.
    ///
    /// Fails with [`PublishError::MissingCredential`] when no record exists
    /// or the record has no platform account id. Read-only.
    pub async fn resolve(&self, owner_id: &str) -> Result<InstagramConnection> {
        let connection = match self.db.get_connection(owner_id).await? {
            Some(conn) => Some(conn),
            None => {
                debug!(owner_id, "no connection keyed by owner id, trying field lookup");
                self.db.find_connection_by_owner(owner_id).await?
            }
        };

        match connection {
            Some(conn) if !conn.ig_user_id.is_empty() => Ok(conn),
            Some(_) => {
                debug!(owner_id, "connection record has no platform account id");
                Err(PublishError::MissingCredential.into())
            }
            None => Err(PublishError::MissingCredential.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GramcastError;
    use crate::types::InstagramConnection;

    async fn resolver_with(records: Vec<InstagramConnection>) -> ConnectionResolver {
        let db = Database::in_memory().await.unwrap();
        for record in &records {
            db.upsert_connection(record).await.unwrap();
        }
        ConnectionResolver::new(db)
    }

    #[tokio::test]
    async fn test_resolve_by_primary_key() {
        let resolver = resolver_with(vec![InstagramConnection::new(
            "owner-1".to_string(),
            "17841400000000000".to_string(),
            Some("demo".to_string()),
        )])
        .await;

        let conn = resolver.resolve("owner-1").await.unwrap();
        assert_eq!(conn.ig_user_id, "17841400000000000");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_field_query() {
        let resolver = resolver_with(vec![InstagramConnection {
            id: "legacy-doc-id".to_string(),
            owner_id: "owner-2".to_string(),
            ig_user_id: "17841400000000001".to_string(),
            username: None,
            access_token: None,
            connected_at: 1_600_000_000,
        }])
        .await;

        let conn = resolver.resolve("owner-2").await.unwrap();
        assert_eq!(conn.id, "legacy-doc-id");
        assert_eq!(conn.ig_user_id, "17841400000000001");
    }

    #[tokio::test]
    async fn test_resolve_missing_record() {
        let resolver = resolver_with(vec![]).await;

        let err = resolver.resolve("nobody").await.unwrap_err();
        assert!(matches!(
            err,
            GramcastError::Publish(PublishError::MissingCredential)
        ));
        assert_eq!(
            err.failure_message(),
            "no publishing credential for owner"
        );
    }

    #[tokio::test]
    async fn test_resolve_record_without_account_id() {
        // A connect flow that never completed leaves ig_user_id empty;
        // that is equivalent to having no credential at all
        let resolver = resolver_with(vec![InstagramConnection::new(
            "owner-3".to_string(),
            String::new(),
            Some("half-connected".to_string()),
        )])
        .await;

        let err = resolver.resolve("owner-3").await.unwrap_err();
        assert!(matches!(
            err,
            GramcastError::Publish(PublishError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_resolve_prefers_primary_key_over_field_match() {
        let resolver = resolver_with(vec![
            InstagramConnection::new("owner-4".to_string(), "primary".to_string(), None),
            InstagramConnection {
                id: "other-id".to_string(),
                owner_id: "owner-4".to_string(),
                ig_user_id: "secondary".to_string(),
                username: None,
                access_token: None,
                connected_at: 0,
            },
        ])
        .await;

        let conn = resolver.resolve("owner-4").await.unwrap();
        assert_eq!(conn.ig_user_id, "primary");
    }
}
