//! # Media Catalog Bot CLI (`catalog-bot`)
//!
//! The `catalog-bot` binary runs the Telegram bot and offers a few commands
//! for inspecting the catalog database from a shell.
//!
//! ## Usage
//!
//! ```bash
//! catalog-bot --config ./config/bot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog-bot init` | Create the SQLite database and run schema migrations |
//! | `catalog-bot run` | Start the bot (needs `BOT_TOKEN` and `TMDB_API_KEY`) |
//! | `catalog-bot stats` | Print title and episode counts |
//! | `catalog-bot search <query>` | List titles whose name contains `<query>` |
//! | `catalog-bot list-episodes <id>` | List the episodes of a series |
//! | `catalog-bot delete <id>` | Delete a title and its episodes |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! catalog-bot init --config ./config/bot.toml
//!
//! # Start the bot with verbose logs
//! RUST_LOG=media_catalog_bot=debug BOT_TOKEN=... TMDB_API_KEY=... catalog-bot run
//!
//! # Find a title id, then inspect its episodes
//! catalog-bot search "juego de tronos"
//! catalog-bot list-episodes 12
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use media_catalog_bot::{bot, catalog_cmd, config, migrate, stats};

/// Media Catalog Bot — index uploaded films and series with TMDB metadata
/// and serve them back through Telegram.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/bot.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "catalog-bot",
    about = "Media Catalog Bot — a Telegram catalog of films and series backed by TMDB",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/bot.toml`. Secrets are read from the
    /// `BOT_TOKEN` and `TMDB_API_KEY` environment variables instead.
    #[arg(long, global = true, default_value = "./config/bot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the `media` and `episodes`
    /// tables. Safe to run more than once.
    Init,

    /// Start the bot and long-poll Telegram until Ctrl-C.
    Run,

    /// Show catalog statistics.
    Stats,

    /// Search titles by name (case-insensitive substring), newest first.
    Search {
        /// Text to look for in title names.
        query: String,
    },

    /// List the episodes of a series, ordered by season and episode.
    ListEpisodes {
        /// Catalog id of the series.
        title_id: i64,
    },

    /// Delete a title and all of its episodes.
    Delete {
        /// Catalog id of the title.
        title_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_catalog_bot=info".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Run => {
            bot::run_bot(&cfg).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Search { query } => {
            catalog_cmd::run_search(&cfg, &query).await?;
        }
        Commands::ListEpisodes { title_id } => {
            catalog_cmd::run_list_episodes(&cfg, title_id).await?;
        }
        Commands::Delete { title_id } => {
            catalog_cmd::run_delete(&cfg, title_id).await?;
        }
    }

    Ok(())
}
