//! gram-queue - Manage scheduled posts
//!
//! Unix-style tool for managing the scheduled post queue.

use clap::{Parser, Subcommand};
use libgramcast::logging::{LogFormat, LoggingConfig};
use libgramcast::types::PostStatus;
use libgramcast::{Config, Database, GramcastError, Result, ScheduledPost};

#[derive(Parser, Debug)]
#[command(name = "gram-queue")]
#[command(version)]
#[command(about = "Manage scheduled posts")]
#[command(long_about = "\
gram-queue - Manage scheduled posts

DESCRIPTION:
    gram-queue is a Unix-style tool for managing posts in the Gramcast
    queue. Use it to list, cancel, reschedule, or view statistics about
    your scheduled posts.

COMMANDS:
    list        List scheduled posts
    cancel      Cancel (delete) a scheduled post
    reschedule  Move a pending post to a different time
    now         Publish a pending post on the next tick
    stats       Show statistics about the queue

USAGE EXAMPLES:
    # List all posts
    gram-queue list

    # List alice's failed posts in JSON format
    gram-queue list --owner alice --status failed --format json

    # Cancel a specific post
    gram-queue cancel <POST_ID>

    # Reschedule a post
    gram-queue reschedule <POST_ID> \"tomorrow 3pm\"

    # Publish a post on the next daemon tick
    gram-queue now <POST_ID>

    # View queue statistics
    gram-queue stats

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    Database location: ~/.local/share/gramcast/posts.db

    Override with environment variables:
        GRAMCAST_CONFIG    - Path to config file

EXIT CODES:
    0 - Success
    1 - Operation failed
    3 - Invalid input (bad post ID, time format, etc.)

For more information, visit: https://github.com/gramcast/gramcast
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List scheduled posts
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Filter by owner
        #[arg(short, long)]
        owner: Option<String>,

        /// Filter by status (pending, published, failed)
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of posts to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Cancel a scheduled post
    Cancel {
        /// Post ID to cancel
        post_id: Option<String>,

        /// Cancel all pending posts
        #[arg(long)]
        all: bool,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Reschedule a pending post
    Reschedule {
        /// Post ID to reschedule
        post_id: String,

        /// New schedule time (e.g. "tomorrow 3pm", "2h")
        time: String,
    },

    /// Publish a pending post on the next tick
    Now {
        /// Post ID to publish
        post_id: String,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::new(LogFormat::Text, "error".to_string(), cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    match cli.command {
        Commands::List {
            format,
            owner,
            status,
            limit,
        } => list_posts(&db, &format, owner.as_deref(), status.as_deref(), limit).await,
        Commands::Cancel {
            post_id,
            all,
            force,
        } => cancel_posts(&db, post_id.as_deref(), all, force).await,
        Commands::Reschedule { post_id, time } => reschedule_post(&db, &post_id, &time).await,
        Commands::Now { post_id } => publish_now(&db, &post_id).await,
        Commands::Stats { format } => show_stats(&db, &format).await,
    }
}

async fn list_posts(
    db: &Database,
    format: &str,
    owner: Option<&str>,
    status: Option<&str>,
    limit: usize,
) -> Result<()> {
    let status = status.map(PostStatus::parse).transpose()?;
    let posts = db.list_posts(owner, status, limit).await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&posts).unwrap_or_default());
        return Ok(());
    }

    if posts.is_empty() {
        println!("No posts in the queue");
        return Ok(());
    }

    for post in &posts {
        print_post_line(post);
    }
    println!("{} post(s)", posts.len());

    Ok(())
}

fn print_post_line(post: &ScheduledPost) {
    let when = chrono::DateTime::from_timestamp(post.scheduled_at, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| post.scheduled_at.to_string());

    let caption_preview: String = post.caption.chars().take(40).collect();
    let suffix = if post.caption.chars().count() > 40 {
        "..."
    } else {
        ""
    };

    println!(
        "{}  {}  {:9}  {}  {}{}",
        post.id, when, post.status, post.media_kind, caption_preview, suffix
    );

    if let Some(error) = &post.error_message {
        println!("    error: {}", error);
    }
}

async fn cancel_posts(
    db: &Database,
    post_id: Option<&str>,
    all: bool,
    force: bool,
) -> Result<()> {
    if all {
        if !force && !confirm("Cancel ALL pending posts?")? {
            println!("Aborted");
            return Ok(());
        }
        let removed = db.delete_pending_posts().await?;
        println!("Cancelled {} pending post(s)", removed);
        return Ok(());
    }

    let post_id = post_id.ok_or_else(|| {
        GramcastError::InvalidInput("Provide a post ID or use --all".to_string())
    })?;

    if db.delete_post(post_id).await? {
        println!("Cancelled post {}", post_id);
        Ok(())
    } else {
        Err(GramcastError::InvalidInput(format!(
            "No post with ID {}",
            post_id
        )))
    }
}

async fn reschedule_post(db: &Database, post_id: &str, time: &str) -> Result<()> {
    let scheduled_at = libgramcast::scheduling::parse_schedule(time)?;

    if db.reschedule_post(post_id, scheduled_at.timestamp()).await? {
        println!(
            "Rescheduled post {} to {}",
            post_id,
            scheduled_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        Ok(())
    } else {
        Err(GramcastError::InvalidInput(format!(
            "No pending post with ID {} (published and failed posts cannot be rescheduled)",
            post_id
        )))
    }
}

async fn publish_now(db: &Database, post_id: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    if db.reschedule_post(post_id, now).await? {
        println!("Post {} will publish on the next tick", post_id);
        Ok(())
    } else {
        Err(GramcastError::InvalidInput(format!(
            "No pending post with ID {}",
            post_id
        )))
    }
}

async fn show_stats(db: &Database, format: &str) -> Result<()> {
    let stats = db.queue_stats().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default());
        return Ok(());
    }

    println!("Queue statistics:");
    println!("  pending:   {}", stats.pending);
    println!("  published: {}", stats.published);
    println!("  failed:    {}", stats.failed);

    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush().ok();

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| GramcastError::InvalidInput(format!("Failed to read input: {}", e)))?;

    Ok(matches!(input.trim(), "y" | "Y" | "yes"))
}
