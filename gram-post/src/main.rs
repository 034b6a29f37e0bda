//! gram-post - Schedule a post for future publication

use std::io::Read;

use clap::Parser;
use libgramcast::logging::{LogFormat, LoggingConfig};
use libgramcast::types::{validate_caption, validate_media_url};
use libgramcast::{Config, Database, MediaKind, Result, ScheduledPost};

#[derive(Parser, Debug)]
#[command(name = "gram-post")]
#[command(version)]
#[command(about = "Schedule a post for future publication")]
#[command(long_about = "\
gram-post - Schedule a post for future publication

DESCRIPTION:
    gram-post adds a post to the Gramcast queue. The post stays pending
    until its scheduled time arrives, at which point the gram-send daemon
    publishes it to the owner's connected Instagram account.

USAGE EXAMPLES:
    # Schedule an image for tomorrow morning
    gram-post \"Sunrise over the bay\" \\
        --media-url https://cdn.example.com/sunrise.jpg --at \"tomorrow 8am\"

    # Schedule a video in two hours, for a specific owner
    gram-post \"New clip!\" --media-url https://cdn.example.com/clip.mp4 \\
        --kind video --at 2h --owner alice

    # Read the caption from stdin and publish on the next tick
    echo \"Hello\" | gram-post --media-url https://cdn.example.com/a.jpg --at now

CONFIGURATION:
    Configuration file: ~/.config/gramcast/config.toml
    Database location: ~/.local/share/gramcast/posts.db

EXIT CODES:
    0 - Post scheduled
    1 - Database or configuration error
    3 - Invalid input (caption too long, bad media URL, bad time format)

For more information, visit: https://github.com/gramcast/gramcast
")]
struct Cli {
    /// Caption text (reads from stdin if not provided)
    caption: Option<String>,

    /// URL of the image or video to publish
    #[arg(long, value_name = "URL")]
    media_url: String,

    /// Media kind: image or video
    #[arg(long, default_value = "image")]
    kind: String,

    /// When to publish (e.g. "2h", "tomorrow 8am", "now")
    #[arg(long, default_value = "now")]
    at: String,

    /// Owner the post belongs to (defaults to config)
    #[arg(long)]
    owner: Option<String>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
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
    let caption = match cli.caption {
        Some(caption) => caption,
        None => read_caption_from_stdin()?,
    };

    validate_caption(&caption)?;
    validate_media_url(&cli.media_url)?;
    let kind = MediaKind::parse(&cli.kind)?;
    let scheduled_at = libgramcast::scheduling::parse_schedule(&cli.at)?;

    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    let owner = cli.owner.unwrap_or(config.defaults.owner);
    let post = ScheduledPost::new(
        owner,
        caption,
        cli.media_url,
        kind,
        scheduled_at.timestamp(),
    );
    db.create_post(&post).await?;

    match cli.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&post).unwrap_or_default());
        }
        _ => {
            println!("Scheduled post {}", post.id);
            println!(
                "  owner: {}  kind: {}  at: {}",
                post.owner_id,
                post.media_kind,
                scheduled_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    Ok(())
}

fn read_caption_from_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| libgramcast::GramcastError::InvalidInput(format!("Failed to read stdin: {}", e)))?;

    Ok(buffer.trim_end_matches('\n').to_string())
}
