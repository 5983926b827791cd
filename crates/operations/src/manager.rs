use crate::context::OperationContext;
use crate::error::OperationError;
use crate::record::{OperationRecord, OperationSnapshot};
use repolens_protocol::{AnalysisResponse, CancelResponse, OperationKey};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(25);

/// Progress text of a run that has not reported anything yet
pub const INITIAL_PROGRESS: &str = "Starting analysis";

pub const CANCELLED_NOTE: &str = "Analysis cancelled by user";

#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) records: HashMap<OperationKey, OperationRecord>,
    next_generation: u64,
}

pub(crate) type SharedRegistry = Arc<Mutex<Registry>>;

impl Registry {
    fn begin(&mut self, key: &OperationKey) -> (u64, CancellationToken) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let cancel = CancellationToken::new();
        self.records.insert(
            key.clone(),
            OperationRecord::Running {
                progress: INITIAL_PROGRESS.to_string(),
                cancel: cancel.clone(),
                generation,
                started_at: Instant::now(),
            },
        );
        (generation, cancel)
    }

    /// Store the outcome of run `generation`, unless that run was superseded
    pub(crate) fn settle(
        &mut self,
        key: &OperationKey,
        generation: u64,
        outcome: &Result<String, OperationError>,
    ) {
        let started_at = match self.records.get(key) {
            Some(OperationRecord::Running {
                started_at,
                generation: current,
                ..
            }) if *current == generation => *started_at,
            _ => {
                log::debug!("Discarding outcome of superseded run {generation} for {key}");
                return;
            }
        };

        let elapsed = started_at.elapsed();
        let record = match outcome {
            Ok(text) => {
                log::info!("Analysis of {key} completed in {elapsed:.1?}");
                OperationRecord::Completed {
                    result: text.clone(),
                }
            }
            Err(OperationError::Cancelled) => {
                log::info!("Analysis of {key} cancelled after {elapsed:.1?}");
                OperationRecord::Cancelled {
                    note: CANCELLED_NOTE.to_string(),
                }
            }
            Err(OperationError::Failed(message)) => {
                log::warn!("Analysis of {key} failed after {elapsed:.1?}: {message}");
                OperationRecord::Failed {
                    message: message.clone(),
                }
            }
        };
        self.records.insert(key.clone(), record);
    }
}

/// Owns every analysis record, keyed by (repository, branch).
///
/// At most one run per key is in flight. A run that does not finish within
/// the synchronous window keeps going as a background task; callers then poll
/// with [`OperationManager::status`].
#[derive(Debug, Clone)]
pub struct OperationManager {
    registry: SharedRegistry,
    sync_timeout: Duration,
}

impl Default for OperationManager {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_TIMEOUT)
    }
}

impl OperationManager {
    pub fn new(sync_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            sync_timeout,
        }
    }

    pub fn sync_timeout(&self) -> Duration {
        self.sync_timeout
    }

    /// Return the cached result, report an active run, or start `work`.
    ///
    /// `work` is invoked only when a new run starts. Its future is spawned once;
    /// if it outlives the synchronous window the same task carries on in the
    /// background and `Started` is returned.
    pub async fn submit<F, Fut>(&self, key: OperationKey, work: F) -> AnalysisResponse
    where
        F: FnOnce(OperationContext) -> Fut,
        Fut: Future<Output = Result<String, OperationError>> + Send + 'static,
    {
        let ctx = {
            let mut registry = self.registry.lock().await;
            match registry.records.get(&key) {
                Some(OperationRecord::Completed { result }) => {
                    log::debug!("Serving cached analysis for {key}");
                    return AnalysisResponse::Completed {
                        text: result.clone(),
                    };
                }
                Some(OperationRecord::Running { progress, .. }) => {
                    return AnalysisResponse::InProgress {
                        progress: format!("Analysis already in progress for {key}: {progress}"),
                    };
                }
                _ => {}
            }
            let (generation, cancel) = registry.begin(&key);
            OperationContext::new(key.clone(), generation, cancel, Arc::clone(&self.registry))
        };

        log::info!("Starting analysis of {key} (run {})", ctx.generation());
        let future = work(ctx.clone());
        let handle = tokio::spawn(supervise(ctx, future));

        match tokio::time::timeout(self.sync_timeout, handle).await {
            Ok(Ok(outcome)) => response_for(outcome),
            Ok(Err(err)) => AnalysisResponse::Error {
                message: format!("Analysis task failed: {err}"),
            },
            Err(_) => {
                log::info!(
                    "Analysis of {key} exceeded {:?}, continuing in background",
                    self.sync_timeout
                );
                AnalysisResponse::Started {
                    message: format!(
                        "Analysis of {key} is taking longer than {}s and continues in the background. \
                         Use check_analysis_status to poll for the result.",
                        self.sync_timeout.as_secs()
                    ),
                }
            }
        }
    }

    pub async fn status(&self, key: &OperationKey) -> AnalysisResponse {
        let registry = self.registry.lock().await;
        match registry.records.get(key) {
            None => AnalysisResponse::Error {
                message: format!("No analysis found for {key}"),
            },
            Some(OperationRecord::Running { progress, .. }) => AnalysisResponse::InProgress {
                progress: progress.clone(),
            },
            Some(OperationRecord::Completed { result }) => AnalysisResponse::Completed {
                text: result.clone(),
            },
            Some(OperationRecord::Failed { message }) => AnalysisResponse::Error {
                message: message.clone(),
            },
            Some(OperationRecord::Cancelled { note }) => AnalysisResponse::Cancelled {
                message: note.clone(),
            },
        }
    }

    /// Signal the active run for `key`, optionally dropping a stored outcome.
    pub async fn cancel(&self, key: &OperationKey, clear_cache: bool) -> CancelResponse {
        let mut registry = self.registry.lock().await;
        let previous = registry.records.remove(key);

        let mut had_running_task = false;
        let mut had_cached_result = false;
        let mut cache_cleared = false;
        let mut cleared_outcome = None;

        match previous {
            Some(OperationRecord::Running {
                cancel, generation, ..
            }) => {
                log::info!("Cancelling analysis of {key} (run {generation})");
                cancel.cancel();
                had_running_task = true;
                registry.records.insert(
                    key.clone(),
                    OperationRecord::Cancelled {
                        note: CANCELLED_NOTE.to_string(),
                    },
                );
            }
            Some(record @ OperationRecord::Completed { .. }) => {
                had_cached_result = true;
                if clear_cache {
                    cache_cleared = true;
                } else {
                    registry.records.insert(key.clone(), record);
                }
            }
            Some(record) => {
                if clear_cache {
                    cache_cleared = true;
                    cleared_outcome = Some(record.state_name());
                } else {
                    registry.records.insert(key.clone(), record);
                }
            }
            None => {}
        }

        let message = match (had_running_task, had_cached_result, cache_cleared) {
            (true, _, _) => format!("Cancelled running analysis of {key}"),
            (false, true, true) => format!("Cleared cached result for {key}"),
            (false, true, false) => format!(
                "No running analysis for {key}; cached result kept (pass clear_cache to remove it)"
            ),
            (false, false, true) => format!(
                "No running analysis for {key}; cleared {} outcome",
                cleared_outcome.unwrap_or("previous")
            ),
            (false, false, false) => format!("No running analysis or cached result for {key}"),
        };

        CancelResponse {
            message,
            had_running_task,
            had_cached_result,
            cache_cleared,
        }
    }

    pub async fn snapshot(&self) -> OperationSnapshot {
        let registry = self.registry.lock().await;
        let mut snapshot = OperationSnapshot::default();
        for record in registry.records.values() {
            match record {
                OperationRecord::Running { .. } => snapshot.running += 1,
                OperationRecord::Completed { .. } => snapshot.completed += 1,
                OperationRecord::Failed { .. } => snapshot.failed += 1,
                OperationRecord::Cancelled { .. } => snapshot.cancelled += 1,
            }
        }
        snapshot
    }
}

/// Run `work` on its own task so a cancel or a panic still settles the record.
async fn supervise<Fut>(ctx: OperationContext, work: Fut) -> Result<String, OperationError>
where
    Fut: Future<Output = Result<String, OperationError>> + Send + 'static,
{
    let token = ctx.cancel_token();
    let mut task = tokio::spawn(work);

    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => {
            task.abort();
            Err(OperationError::Cancelled)
        }
        joined = &mut task => match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => {
                log::error!("Analysis task for {} panicked", ctx.key());
                Err(OperationError::failed("Analysis task panicked"))
            }
            Err(_) => Err(OperationError::Cancelled),
        },
    };

    ctx.settle(&outcome).await;
    outcome
}

fn response_for(outcome: Result<String, OperationError>) -> AnalysisResponse {
    match outcome {
        Ok(text) => AnalysisResponse::Completed { text },
        Err(OperationError::Cancelled) => AnalysisResponse::Cancelled {
            message: CANCELLED_NOTE.to_string(),
        },
        Err(OperationError::Failed(message)) => AnalysisResponse::Error { message },
    }
}
