use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Normalized, Profile, Source};
use crate::normalizer::Normalizer;

pub const DEFAULT_WORKERS: usize = 10;

/// Polls many sources at once with a bounded number of workers.
pub struct ParallelNormalizer {
    ctx: Arc<AppContext>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
}

impl ParallelNormalizer {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self::with_workers(ctx, DEFAULT_WORKERS)
    }

    pub fn with_workers(ctx: Arc<AppContext>, workers: usize) -> Self {
        Self {
            ctx,
            normalizer: Normalizer::new(),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Normalize every source; results come back in input order, each paired
    /// with the source it belongs to.
    pub async fn normalize_all(
        &self,
        profile: &Profile,
        sources: Vec<Source>,
    ) -> Vec<(Source, Result<Normalized>)> {
        let mut handles = Vec::new();

        for source in sources {
            let ctx = self.ctx.clone();
            let semaphore = self.semaphore.clone();
            let normalizer = self.normalizer.clone();
            let profile = profile.clone();
            let task_source = source.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return Err(TributaryError::Other("worker pool closed".into()));
                };

                let result = normalizer.normalize(&ctx, &profile, &task_source, None).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        "Failed to normalize {} source {}: {}",
                        task_source.source_type,
                        task_source.id,
                        e
                    );
                }
                result
            });

            handles.push((source, handle));
        }

        join_in_order(handles).await
    }
}

/// Await every task; a task that panicked or was cancelled yields an error
/// for its source instead of disappearing from the output.
async fn join_in_order(
    handles: Vec<(Source, JoinHandle<Result<Normalized>>)>,
) -> Vec<(Source, Result<Normalized>)> {
    let mut results = Vec::with_capacity(handles.len());
    for (source, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Task join error for source {}: {}", source.id, e);
                Err(TributaryError::Other(format!("worker task failed: {e}")))
            }
        };
        results.push((source, result));
    }
    results
}
