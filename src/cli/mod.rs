pub mod delete;
pub mod import;
pub mod install;
pub mod submission;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "submissions-admin",
    version,
    about = "Review, search and delete form submissions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file (defaults to settings.toml in the config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or upgrade the database schema
    Install,
    /// Import submissions from a JSON array
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
    /// List submissions one page at a time
    List {
        /// Case-insensitive search on name and email
        #[arg(long, short)]
        search: Option<String>,
        /// Sort column
        #[arg(long, value_parser = ["id", "name", "date_submitted", "date"])]
        orderby: Option<String>,
        /// Sort direction
        #[arg(long, default_value = "asc", value_parser = ["asc", "desc"])]
        order: String,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Rows per page (1-999)
        #[arg(long)]
        per_page: Option<u32>,
        /// Only show read or unread submissions
        #[arg(long, value_parser = ["read", "unread"])]
        status: Option<String>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one submission in full
    Show {
        /// Submission ID
        id: i64,
    },
    /// Delete one or more submissions
    Delete {
        /// Submission IDs
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Run the back-office web screen
    Serve {
        /// Address to listen on (overrides the settings file)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}
