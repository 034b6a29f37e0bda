//! gram-creds - Manage per-owner Instagram connections
//!
//! The connect flow writes one connection record per owner: the Instagram
//! account id used as the publish target, the handle, and the token the
//! flow was granted. Records are keyed by the owner id; the pipeline also
//! tolerates older records keyed differently.

use clap::{Parser, Subcommand};
use libgramcast::logging::{LogFormat, LoggingConfig};
use libgramcast::{Config, Database, GramcastError, InstagramConnection, Result};

#[derive(Parser, Debug)]
#[command(name = "gram-creds")]
#[command(version)]
#[command(about = "Manage per-owner Instagram connections")]
#[command(long_about = "\
gram-creds - Manage per-owner Instagram connections

DESCRIPTION:
    gram-creds manages the connection records the publish pipeline
    resolves before each post: which Instagram account an owner publishes
    to, and the token captured when the account was connected.

COMMANDS:
    set       Create or update an owner's connection
    show      Show an owner's connection
    list      List all connections
    remove    Remove an owner's connection

USAGE EXAMPLES:
    # Connect alice to an Instagram business account
    gram-creds set --owner alice --ig-user-id 17841400000000000 \\
        --username alice_official

    # Show alice's connection
    gram-creds show --owner alice

    # Remove a connection
    gram-creds remove --owner alice

EXIT CODES:
    0 - Success
    1 - Operation failed
    3 - Invalid input

For more information, visit: https://github.com/gramcast/gramcast
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update an owner's connection
    Set {
        /// Owner the connection belongs to
        #[arg(long)]
        owner: String,

        /// Instagram account id used as the publish target
        #[arg(long)]
        ig_user_id: String,

        /// Instagram handle (informational)
        #[arg(long)]
        username: Option<String>,

        /// Access token granted by the connect flow (prompted if omitted)
        #[arg(long)]
        token: Option<String>,

        /// Skip the token prompt entirely
        #[arg(long)]
        no_token: bool,
    },

    /// Show an owner's connection
    Show {
        #[arg(long)]
        owner: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List all connections
    List {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove an owner's connection
    Remove {
        #[arg(long)]
        owner: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::new(LogFormat::Text, "error".to_string(), false).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    match cli.command {
        Commands::Set {
            owner,
            ig_user_id,
            username,
            token,
            no_token,
        } => set_connection(&db, owner, ig_user_id, username, token, no_token).await,
        Commands::Show { owner, format } => show_connection(&db, &owner, &format).await,
        Commands::List { format } => list_connections(&db, &format).await,
        Commands::Remove { owner } => remove_connection(&db, &owner).await,
    }
}

async fn set_connection(
    db: &Database,
    owner: String,
    ig_user_id: String,
    username: Option<String>,
    token: Option<String>,
    no_token: bool,
) -> Result<()> {
    if owner.trim().is_empty() {
        return Err(GramcastError::InvalidInput(
            "Owner cannot be empty".to_string(),
        ));
    }
    if ig_user_id.trim().is_empty() {
        return Err(GramcastError::InvalidInput(
            "Instagram user id cannot be empty".to_string(),
        ));
    }

    let access_token = if no_token {
        None
    } else {
        match token {
            Some(token) => Some(token),
            None => prompt_token()?,
        }
    };

    let mut connection = InstagramConnection::new(owner.clone(), ig_user_id, username);
    connection.access_token = access_token;
    db.upsert_connection(&connection).await?;

    println!("Connection saved for owner {}", owner);
    Ok(())
}

fn prompt_token() -> Result<Option<String>> {
    let token = rpassword::prompt_password("Access token (leave empty to skip): ")
        .map_err(|e| GramcastError::InvalidInput(format!("Failed to read token: {}", e)))?;

    let token = token.trim().to_string();
    Ok((!token.is_empty()).then_some(token))
}

async fn lookup(db: &Database, owner: &str) -> Result<InstagramConnection> {
    let connection = match db.get_connection(owner).await? {
        Some(conn) => Some(conn),
        None => db.find_connection_by_owner(owner).await?,
    };

    connection.ok_or_else(|| {
        GramcastError::InvalidInput(format!("No connection found for owner {}", owner))
    })
}

async fn show_connection(db: &Database, owner: &str, format: &str) -> Result<()> {
    let connection = lookup(db, owner).await?;

    if format == "json" {
        // Never print the stored token
        let redacted = InstagramConnection {
            access_token: connection.access_token.as_ref().map(|_| "***".to_string()),
            ..connection
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&redacted).unwrap_or_default()
        );
        return Ok(());
    }

    print_connection_line(&connection);
    Ok(())
}

async fn list_connections(db: &Database, format: &str) -> Result<()> {
    let connections = db.list_connections().await?;

    if format == "json" {
        let redacted: Vec<InstagramConnection> = connections
            .into_iter()
            .map(|conn| InstagramConnection {
                access_token: conn.access_token.as_ref().map(|_| "***".to_string()),
                ..conn
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&redacted).unwrap_or_default()
        );
        return Ok(());
    }

    if connections.is_empty() {
        println!("No connections");
        return Ok(());
    }

    for connection in &connections {
        print_connection_line(connection);
    }
    Ok(())
}

fn print_connection_line(connection: &InstagramConnection) {
    let connected = chrono::DateTime::from_timestamp(connection.connected_at, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    println!(
        "{}  ig:{}  {}  connected {}  token: {}",
        connection.owner_id,
        if connection.ig_user_id.is_empty() {
            "<none>"
        } else {
            &connection.ig_user_id
        },
        connection.username.as_deref().unwrap_or("-"),
        connected,
        if connection.access_token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
}

async fn remove_connection(db: &Database, owner: &str) -> Result<()> {
    if db.delete_connection(owner).await? {
        println!("Removed connection for owner {}", owner);
        Ok(())
    } else {
        Err(GramcastError::InvalidInput(format!(
            "No connection found for owner {}",
            owner
        )))
    }
}
