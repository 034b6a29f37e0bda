//! Integration tests for the gram-send daemon

use assert_cmd::Command;
use libgramcast::{Database, InstagramConnection, MediaKind, PostStatus, ScheduledPost};
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup test environment with config and database
async fn setup_test_env(api_base: &str) -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("posts.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[instagram]
api_base = "{}"

[scheduling]
poll_interval = 1
"#,
        db_path.display().to_string().replace('\\', "/"),
        api_base
    );

    fs::write(&config_path, config_content).unwrap();

    // Initialize database
    let _db = Database::new(db_path.to_str().unwrap()).await.unwrap();

    (
        temp_dir,
        config_path.to_str().unwrap().to_string(),
        db_path.to_str().unwrap().to_string(),
    )
}

/// Create a post that is due for publishing
async fn create_due_post(db_path: &str, owner: &str) -> String {
    let db = Database::new(db_path).await.unwrap();
    let now = chrono::Utc::now().timestamp();

    let post = ScheduledPost::new(
        owner.to_string(),
        "Test scheduled post".to_string(),
        "https://example.com/photo.jpg".to_string(),
        MediaKind::Image,
        now - 10,
    );

    let post_id = post.id.clone();
    db.create_post(&post).await.unwrap();
    post_id
}

async fn connect_owner(db_path: &str, owner: &str, ig_user_id: &str) {
    let db = Database::new(db_path).await.unwrap();
    db.upsert_connection(&InstagramConnection::new(
        owner.to_string(),
        ig_user_id.to_string(),
        None,
    ))
    .await
    .unwrap();
}

// BASIC FUNCTIONALITY TESTS

#[tokio::test]
async fn test_daemon_starts_with_config() {
    let (_temp_dir, config_path, _db_path) = setup_test_env("http://127.0.0.1:1").await;

    let mut cmd = Command::cargo_bin("gram-send").unwrap();

    // Run with --once flag to exit immediately
    cmd.env("GRAMCAST_CONFIG", &config_path)
        .env_remove("GRAMCAST_ACCESS_TOKEN")
        .arg("--once")
        .assert()
        .success();
}

#[tokio::test]
async fn test_once_with_empty_queue_is_a_noop() {
    let (_temp_dir, config_path, db_path) = setup_test_env("http://127.0.0.1:1").await;

    Command::cargo_bin("gram-send")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .env_remove("GRAMCAST_ACCESS_TOKEN")
        .arg("--once")
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains("exiting"));

    let db = Database::new(&db_path).await.unwrap();
    assert!(db.list_posts(None, None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_config_fails() {
    let mut cmd = Command::cargo_bin("gram-send").unwrap();

    cmd.env("GRAMCAST_CONFIG", "/nonexistent/gramcast/config.toml")
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

// PIPELINE TESTS

#[tokio::test(flavor = "multi_thread")]
async fn test_once_publishes_due_post() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1784140009/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "container-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1784140009/media_publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "media-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let (_temp_dir, config_path, db_path) = setup_test_env(&server.uri()).await;
    connect_owner(&db_path, "alice", "1784140009").await;
    let post_id = create_due_post(&db_path, "alice").await;

    let assert = {
        let config_path = config_path.clone();
        tokio::task::spawn_blocking(move || {
            Command::cargo_bin("gram-send")
                .unwrap()
                .env("GRAMCAST_CONFIG", &config_path)
                .env("GRAMCAST_ACCESS_TOKEN", "integration-token")
                .arg("--once")
                .assert()
        })
        .await
        .unwrap()
    };
    assert.success();

    let db = Database::new(&db_path).await.unwrap();
    let post = db.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Published);
    assert!(post.published_at.is_some());
    assert_eq!(post.error_message, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_once_records_platform_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/1784140010/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "container-2"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/1784140010/media_publish"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Media ID is not available"}
        })))
        .mount(&server)
        .await;

    let (_temp_dir, config_path, db_path) = setup_test_env(&server.uri()).await;
    connect_owner(&db_path, "bob", "1784140010").await;
    let post_id = create_due_post(&db_path, "bob").await;

    let assert = {
        let config_path = config_path.clone();
        tokio::task::spawn_blocking(move || {
            Command::cargo_bin("gram-send")
                .unwrap()
                .env("GRAMCAST_CONFIG", &config_path)
                .env("GRAMCAST_ACCESS_TOKEN", "integration-token")
                .arg("--once")
                .assert()
        })
        .await
        .unwrap()
    };
    assert.success();

    let db = Database::new(&db_path).await.unwrap();
    let post = db.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Failed);
    assert_eq!(
        post.error_message,
        Some("Media ID is not available".to_string())
    );
    assert_eq!(post.published_at, None);
}

#[tokio::test]
async fn test_once_marks_unconnected_owner_failed() {
    // No network involved: credential resolution fails before any request
    let (_temp_dir, config_path, db_path) = setup_test_env("http://127.0.0.1:1").await;
    let post_id = create_due_post(&db_path, "nobody").await;

    Command::cargo_bin("gram-send")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .env("GRAMCAST_ACCESS_TOKEN", "integration-token")
        .arg("--once")
        .assert()
        .success();

    let db = Database::new(&db_path).await.unwrap();
    let post = db.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Failed);
    assert_eq!(
        post.error_message,
        Some("no publishing credential for owner".to_string())
    );
}

#[tokio::test]
async fn test_once_without_token_marks_post_failed_not_configured() {
    let (_temp_dir, config_path, db_path) = setup_test_env("http://127.0.0.1:1").await;
    connect_owner(&db_path, "carol", "1784140011").await;
    let post_id = create_due_post(&db_path, "carol").await;

    Command::cargo_bin("gram-send")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .env_remove("GRAMCAST_ACCESS_TOKEN")
        .arg("--once")
        .assert()
        .success();

    let db = Database::new(&db_path).await.unwrap();
    let post = db.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(post.status, PostStatus::Failed);
    assert_eq!(
        post.error_message,
        Some("access token not configured".to_string())
    );
}

#[tokio::test]
async fn test_future_post_survives_a_tick() {
    let (_temp_dir, config_path, db_path) = setup_test_env("http://127.0.0.1:1").await;
    connect_owner(&db_path, "dave", "1784140012").await;

    let db = Database::new(&db_path).await.unwrap();
    let post = ScheduledPost::new(
        "dave".to_string(),
        "Not yet".to_string(),
        "https://example.com/photo.jpg".to_string(),
        MediaKind::Image,
        chrono::Utc::now().timestamp() + 3600,
    );
    db.create_post(&post).await.unwrap();

    Command::cargo_bin("gram-send")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .env("GRAMCAST_ACCESS_TOKEN", "integration-token")
        .arg("--once")
        .assert()
        .success();

    let stored = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Pending);
}
