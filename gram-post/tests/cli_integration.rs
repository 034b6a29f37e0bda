//! Integration tests for gram-post

use assert_cmd::Command;
use libgramcast::{Database, PostStatus};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test environment with config and database
fn setup_test_env() -> (TempDir, String, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("posts.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[defaults]
owner = "tester"
"#,
        db_path.display().to_string().replace('\\', "/")
    );

    fs::write(&config_path, config_content).unwrap();

    (
        temp_dir,
        config_path.to_string_lossy().to_string(),
        db_path.to_string_lossy().to_string(),
    )
}

#[tokio::test]
async fn test_schedule_post_creates_pending_row() {
    let (_temp_dir, config_path, db_path) = setup_test_env();

    let mut cmd = Command::cargo_bin("gram-post").unwrap();
    let output = cmd
        .env("GRAMCAST_CONFIG", &config_path)
        .arg("A test caption")
        .arg("--media-url")
        .arg("https://example.com/photo.jpg")
        .arg("--at")
        .arg("2h")
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let post: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let post_id = post["id"].as_str().unwrap().to_string();
    assert_eq!(post["owner_id"], "tester");
    assert_eq!(post["caption"], "A test caption");
    assert_eq!(post["media_kind"], "Image");

    let db = Database::new(&db_path).await.unwrap();
    let stored = db.get_post(&post_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Pending);
    assert!(stored.scheduled_at > chrono::Utc::now().timestamp() + 3600);
}

#[tokio::test]
async fn test_schedule_video_with_explicit_owner() {
    let (_temp_dir, config_path, db_path) = setup_test_env();

    Command::cargo_bin("gram-post")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .arg("A clip")
        .arg("--media-url")
        .arg("https://example.com/clip.mp4")
        .arg("--kind")
        .arg("video")
        .arg("--owner")
        .arg("alice")
        .arg("--at")
        .arg("now")
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled post"));

    let db = Database::new(&db_path).await.unwrap();
    let posts = db.list_posts(Some("alice"), None, 10).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].media_kind, libgramcast::MediaKind::Video);
}

#[tokio::test]
async fn test_caption_from_stdin() {
    let (_temp_dir, config_path, db_path) = setup_test_env();

    Command::cargo_bin("gram-post")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .arg("--media-url")
        .arg("https://example.com/photo.jpg")
        .write_stdin("Caption from a pipe\n")
        .assert()
        .success();

    let db = Database::new(&db_path).await.unwrap();
    let posts = db.list_posts(None, None, 10).await.unwrap();
    assert_eq!(posts[0].caption, "Caption from a pipe");
}

#[test]
fn test_caption_over_limit_is_rejected() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    let long_caption = "a".repeat(2201);

    Command::cargo_bin("gram-post")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .arg(&long_caption)
        .arg("--media-url")
        .arg("https://example.com/photo.jpg")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("character limit"));
}

#[test]
fn test_invalid_media_kind_is_rejected() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    Command::cargo_bin("gram-post")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .arg("Caption")
        .arg("--media-url")
        .arg("https://example.com/photo.gif")
        .arg("--kind")
        .arg("carousel")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Unknown media kind"));
}

#[test]
fn test_invalid_schedule_is_rejected() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    Command::cargo_bin("gram-post")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .arg("Caption")
        .arg("--media-url")
        .arg("https://example.com/photo.jpg")
        .arg("--at")
        .arg("whenever you feel like it")
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_non_http_media_url_is_rejected() {
    let (_temp_dir, config_path, _db_path) = setup_test_env();

    Command::cargo_bin("gram-post")
        .unwrap()
        .env("GRAMCAST_CONFIG", &config_path)
        .arg("Caption")
        .arg("--media-url")
        .arg("/local/photo.jpg")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("http"));
}
