use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "userstore")]
#[command(author, version, about = "Pooled, transactional CRUD over a users table")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Create the users table first if it does not exist
    #[arg(long, global = true)]
    pub init_schema: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the database is reachable
    Probe,

    /// Create a user record
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address
        #[arg(long)]
        email: String,

        /// Age in years
        #[arg(long)]
        age: Option<i64>,
    },

    /// Show one user record
    Get {
        /// Record id
        id: i64,
    },

    /// List all user records
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of a user record
    Update {
        /// Record id
        id: i64,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New email address
        #[arg(long)]
        email: Option<String>,

        /// New age
        #[arg(long)]
        age: Option<i64>,
    },

    /// Delete a user record
    Delete {
        /// Record id
        id: i64,
    },

    /// Run a scripted create/read/update/delete walkthrough
    Demo,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
