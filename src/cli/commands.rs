use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::app::{AppContext, Result};
use crate::domain::{Profile, Source, SourceType};
use crate::favicon;
use crate::identity;
use crate::normalizer::parallel::ParallelNormalizer;
use crate::normalizer::Normalizer;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_profile(path: Option<&Path>) -> Result<Profile> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Profile::default()),
    }
}

pub async fn normalize_source(
    ctx: &AppContext,
    source_path: &Path,
    profile_path: Option<&Path>,
    raw_path: Option<&Path>,
) -> Result<()> {
    let source: Source = read_json(source_path)?;
    let profile = read_profile(profile_path)?;
    let raw = raw_path.map(std::fs::read).transpose()?;

    let normalized = Normalizer::new()
        .normalize(ctx, &profile, &source, raw.as_deref())
        .await?;

    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}

pub async fn poll_sources(
    ctx: Arc<AppContext>,
    sources_path: &Path,
    profile_path: Option<&Path>,
    workers: usize,
    json: bool,
) -> Result<()> {
    let sources: Vec<Source> = read_json(sources_path)?;
    let profile = read_profile(profile_path)?;

    if sources.is_empty() {
        println!("No sources to poll");
        return Ok(());
    }

    if !json {
        println!("Polling {} sources...", sources.len());
    }

    let results = ParallelNormalizer::with_workers(ctx, workers)
        .normalize_all(&profile, sources)
        .await;

    let mut normalized = Vec::new();
    let mut total_items = 0;
    let mut errors = 0;

    for (source, result) in results {
        match result {
            Ok(out) => {
                total_items += out.items.len();
                if !json {
                    println!("  {} items from {}", out.items.len(), out.source.title);
                }
                normalized.push(out);
            }
            Err(e) => {
                errors += 1;
                let retry = if e.is_retryable() { "" } else { " (not retryable)" };
                eprintln!("  Error polling {} source {}: {}{}", source.source_type, source.id, e, retry);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&normalized)?);
    } else {
        println!("Poll complete: {} items, {} errors", total_items, errors);
    }
    Ok(())
}

pub async fn find_favicon(ctx: &AppContext, url: &str) -> Result<()> {
    match favicon::resolve(&*ctx.fetcher, &ctx.config.fetch, url, None).await {
        Some(icon) => println!(
            "{}\n  rel: {}, type: {}, size: {} bytes",
            icon.url, icon.rel, icon.content_type, icon.size
        ),
        None => println!("No favicon found for {}", url),
    }
    Ok(())
}

pub fn print_source_id(source_type: SourceType, user_id: &str, column_id: &str, canonical: &str) {
    println!("{}", identity::source_id(source_type, user_id, column_id, canonical));
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_profile() {
        let file = json_file(r#"{"id":"u","accountGithub":{"token":"abc"}}"#);
        let profile = read_profile(Some(file.path())).unwrap();
        assert_eq!(profile.account_github.unwrap().token, "abc");

        assert!(read_profile(None).unwrap().account_github.is_none());
    }

    #[test]
    fn test_read_sources() {
        let file = json_file(
            r#"[{"id":"","columnId":"c","userId":"u","type":"reddit","options":{"reddit":"/r/rust"}}]"#,
        );
        let sources: Vec<Source> = read_json(file.path()).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_type, SourceType::Reddit);
    }

    #[test]
    fn test_read_invalid_json() {
        let file = json_file("{not json");
        assert!(read_json::<Source>(file.path()).is_err());
    }
}
