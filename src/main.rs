use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tributary::app::AppContext;
use tributary::cli::{commands, Cli, Commands};
use tributary::config::Config;
use tributary::services::MemoryCache;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?.cache(Arc::new(MemoryCache::default()));

    match cli.command {
        Commands::Normalize { source, profile, raw } => {
            commands::normalize_source(&ctx, &source, profile.as_deref(), raw.as_deref()).await?;
        }
        Commands::Poll { sources, profile, json } => {
            commands::poll_sources(Arc::new(ctx), &sources, profile.as_deref(), cli.workers, json)
                .await?;
        }
        Commands::Favicon { url } => {
            commands::find_favicon(&ctx, &url).await?;
        }
        Commands::SourceId {
            source_type,
            user_id,
            column_id,
            canonical,
        } => {
            commands::print_source_id(source_type, &user_id, &column_id, &canonical);
        }
    }

    Ok(())
}
