//! # posts-cli
//!
//! Command-line front-end for postsync.
//!
//! ## Commands
//!
//! - `login` / `logout`: Manage the signed-in user
//! - `list`: Show the posts of the current partition
//! - `add`: Create a post
//! - `set-status`: Change a post's status
//! - `delete`: Delete a post
//! - `menu`: Show or select a post's actions
//! - `status`: Show session and post counts
//!
//! ## Example
//!
//! ```bash
//! posts-cli login --user alice
//! posts-cli add "Groceries" --description "milk, eggs"
//! posts-cli list
//! posts-cli set-status 1a2b3c4d InProgress
//! posts-cli menu 1a2b3c4d --select "Mark Complete"
//! posts-cli delete 1a2b3c4d
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postsync_core::Screen;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{add, delete, list, login, logout, menu, set_status, status};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "POSTS_LOG";

/// Command-line front-end for postsync.
#[derive(Parser, Debug)]
#[command(name = "posts-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the session, settings and post records
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Partition to use instead of the signed-in user's own
    #[arg(long, global = true)]
    partition: Option<String>,

    /// Log lifecycle details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in as a user
    Login {
        /// User name
        #[arg(long, short)]
        user: String,

        /// Partition to use by default instead of the user's own
        #[arg(long = "default-partition")]
        default_partition: Option<String>,
    },

    /// Sign out
    Logout,

    /// List posts
    List {
        /// Screen to list from (Feed or Friends)
        #[arg(long, default_value = "Feed")]
        screen: Screen,
    },

    /// Create a post
    Add {
        /// Post name (blank uses the default name)
        name: String,

        /// Post description
        #[arg(long, short, default_value = "")]
        description: String,
    },

    /// Change a post's status (Open, InProgress, Complete)
    SetStatus {
        /// Post id or unique id prefix
        id: String,

        /// New status
        status: String,
    },

    /// Delete a post
    Delete {
        /// Post id or unique id prefix
        id: String,
    },

    /// Show a post's action menu
    Menu {
        /// Post id or unique id prefix
        id: String,

        /// Menu entry to run, e.g. "Mark Complete"
        #[arg(long, short)]
        select: Option<String>,
    },

    /// Show session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let partition = cli.partition.as_deref();

    match cli.command {
        Commands::Login {
            user,
            default_partition,
        } => {
            login::run(&data_dir, &user, default_partition.as_deref()).await?;
        }
        Commands::Logout => {
            logout::run(&data_dir).await?;
        }
        Commands::List { screen } => {
            list::run(&data_dir, partition, screen).await?;
        }
        Commands::Add { name, description } => {
            add::run(&data_dir, partition, &name, &description).await?;
        }
        Commands::SetStatus { id, status } => {
            set_status::run(&data_dir, partition, &id, &status).await?;
        }
        Commands::Delete { id } => {
            delete::run(&data_dir, partition, &id).await?;
        }
        Commands::Menu { id, select } => {
            menu::run(&data_dir, partition, &id, select.as_deref()).await?;
        }
        Commands::Status => {
            status::run(&data_dir, partition).await?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber.
///
/// `POSTS_LOG` takes an `EnvFilter` directive; `--verbose` overrides it.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Get the default data directory for posts-cli.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "postsync", "posts-cli")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
