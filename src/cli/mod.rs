pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::SourceType;
use crate::normalizer::parallel::DEFAULT_WORKERS;

#[derive(Parser)]
#[command(name = "tributary")]
#[command(about = "Normalize feeds from many platforms into sources and items", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/tributary/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of sources polled at once
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll one source and print the normalized source and items as JSON
    Normalize {
        /// Path to the source JSON
        source: PathBuf,

        /// Path to the owner's profile JSON
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Already fetched feed data to use instead of fetching
        #[arg(short, long)]
        raw: Option<PathBuf>,
    },
    /// Poll every source of a JSON array
    Poll {
        /// Path to a JSON array of sources
        sources: PathBuf,

        /// Path to the owner's profile JSON
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Print the results as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Find the best favicon of a page
    Favicon {
        /// Page url
        url: String,
    },
    /// Print the id a new source would get
    SourceId {
        source_type: SourceType,
        user_id: String,
        column_id: String,
        /// Canonical url or identifier of the source
        canonical: String,
    },
}
