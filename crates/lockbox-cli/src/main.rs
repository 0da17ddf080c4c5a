//! Lockbox - an encrypted single-user secrets store
//!
//! Command line frontend over `lockbox-core`.

mod app;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use app::{App, UpdateRequest};

/// Lockbox - an encrypted single-user secrets store
#[derive(Parser, Debug)]
#[command(name = "lockbox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to the encrypted vault file (overrides config)
    #[arg(short, long, value_name = "FILE")]
    vault: Option<PathBuf>,

    /// Master password (prompted for when absent)
    #[arg(long, env = "LOCKBOX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored entries
    List {
        /// Only show entries in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one entry, including its password
    Show { id: String },
    /// Store a new entry with a generated password
    Add {
        service: String,
        /// Category name (created if unknown)
        #[arg(short, long)]
        category: Option<String>,
        /// Length of the generated password
        #[arg(short, long)]
        length: Option<usize>,
    },
    /// Replace an entry; a new password is generated unless one is given
    Update {
        id: String,
        #[arg(long)]
        service: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Password to store instead of a generated one
        #[arg(long, conflicts_with = "length")]
        secret: Option<String>,
        /// Length of the generated password
        #[arg(short, long)]
        length: Option<usize>,
    },
    /// Delete an entry
    Delete { id: String },
    /// List categories
    Categories,
    /// Fuzzy search over service and category names
    Search { query: String },
    /// Change the master password
    ChangeMaster,
    /// Show vault location and counts
    Status,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lockbox=info".parse()?))
        .with_writer(std::io::stderr) // Keep stdout for command output
        .init();

    // Load configuration
    let mut config = config::Config::load(args.config)?;

    // Override vault path if provided via CLI
    if let Some(vault_path) = args.vault {
        tracing::info!("Overriding vault path from CLI: {}", vault_path.display());
        config.vault_path = vault_path;
    }

    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Master password: ").context("Failed to read master password")?,
    };

    let app = App::unlock(config, &password)?;
    let mut out = io::stdout().lock();

    match args.command {
        Command::List { category } => app.list(category.as_deref(), &mut out),
        Command::Show { id } => app.show(&id, &mut out),
        Command::Add { service, category, length } => app.add(&service, category.as_deref(), length, &mut out),
        Command::Update {
            id,
            service,
            category,
            secret,
            length,
        } => app.update(
            &id,
            UpdateRequest {
                service,
                category,
                secret,
                length,
            },
            &mut out,
        ),
        Command::Delete { id } => app.delete(&id, &mut out),
        Command::Categories => app.categories(&mut out),
        Command::Search { query } => app.print_search(&query, &mut out),
        Command::ChangeMaster => {
            let new_password =
                rpassword::prompt_password("New master password: ").context("Failed to read new master password")?;
            let confirm =
                rpassword::prompt_password("Confirm new master password: ").context("Failed to read confirmation")?;
            app.change_master(&password, &new_password, &confirm, &mut out)
        }
        Command::Status => app.status(&mut out),
    }
}
