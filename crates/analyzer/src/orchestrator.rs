use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::fetch::{GitFetcher, RepoFetcher};
use crate::model::{GeminiClient, ModelClient};
use crate::prompt::{batch_prompt, final_prompt, overview, pack_batches, CodeSection};
use crate::scan::{scan_repository, RepositoryScan};
use repolens_operations::{OperationContext, OperationError, OperationManager};
use repolens_protocol::{AnalysisResponse, CancelResponse, OperationKey};
use std::sync::Arc;
use std::time::Duration;

pub const PROGRESS_CLONING: &str = "Cloning repository";
pub const PROGRESS_SCANNING: &str = "Scanning source files";
pub const PROGRESS_FINAL: &str = "Writing final summary";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Validate a request and build its canonical key.
pub fn operation_key(repo_url: Option<&str>, branch: Option<&str>) -> Result<OperationKey> {
    let url = repo_url.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(AnalysisError::validation("repo_url is required"));
    }
    if url.starts_with('-') {
        return Err(AnalysisError::validation("repo_url must not start with '-'"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(AnalysisError::validation("repo_url must not contain whitespace"));
    }
    Ok(OperationKey::new(url, branch))
}

/// Collaborators shared by every run
struct Pipeline {
    fetcher: Arc<dyn RepoFetcher>,
    model: Arc<dyn ModelClient>,
    config: AnalyzerConfig,
}

/// Entry point for analyses: validates requests and drives runs through the
/// [`OperationManager`].
#[derive(Clone)]
pub struct Analyzer {
    pipeline: Arc<Pipeline>,
    manager: OperationManager,
}

impl Analyzer {
    pub fn new(
        fetcher: Arc<dyn RepoFetcher>,
        model: Arc<dyn ModelClient>,
        manager: OperationManager,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            pipeline: Arc::new(Pipeline {
                fetcher,
                model,
                config,
            }),
            manager,
        }
    }

    /// Git fetcher, Gemini client and a manager using the configured timeout
    pub fn from_config(config: AnalyzerConfig) -> Result<Self> {
        let fetcher = Arc::new(GitFetcher::new(config.clone_timeout()));
        let model = Arc::new(GeminiClient::from_config(&config)?);
        let manager = OperationManager::new(config.sync_timeout());
        Ok(Self::new(fetcher, model, manager, config))
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.pipeline.config
    }

    pub fn manager(&self) -> &OperationManager {
        &self.manager
    }

    pub async fn analyze(&self, repo_url: &str, branch: Option<&str>) -> AnalysisResponse {
        let key = match operation_key(Some(repo_url), branch) {
            Ok(key) => key,
            Err(err) => return validation_response(err),
        };
        let pipeline = Arc::clone(&self.pipeline);
        self.manager
            .submit(key, move |ctx| async move {
                run_analysis(pipeline, ctx)
                    .await
                    .map_err(OperationError::from)
            })
            .await
    }

    pub async fn check_status(&self, repo_url: &str, branch: Option<&str>) -> AnalysisResponse {
        match operation_key(Some(repo_url), branch) {
            Ok(key) => self.manager.status(&key).await,
            Err(err) => validation_response(err),
        }
    }

    pub async fn cancel(
        &self,
        repo_url: &str,
        branch: Option<&str>,
        clear_cache: bool,
    ) -> Result<CancelResponse> {
        let key = operation_key(Some(repo_url), branch)?;
        Ok(self.manager.cancel(&key, clear_cache).await)
    }

    /// Submit, then poll until the run settles.
    pub async fn analyze_to_completion(
        &self,
        repo_url: &str,
        branch: Option<&str>,
    ) -> AnalysisResponse {
        let mut response = self.analyze(repo_url, branch).await;
        let mut last_progress = String::new();
        while matches!(
            response,
            AnalysisResponse::Started { .. } | AnalysisResponse::InProgress { .. }
        ) {
            tokio::time::sleep(POLL_INTERVAL).await;
            response = self.check_status(repo_url, branch).await;
            if let AnalysisResponse::InProgress { progress } = &response {
                if *progress != last_progress {
                    log::info!("{progress}");
                    last_progress.clone_from(progress);
                }
            }
        }
        response
    }
}

fn validation_response(err: AnalysisError) -> AnalysisResponse {
    AnalysisResponse::Error {
        message: err.to_string(),
    }
}

async fn run_analysis(pipeline: Arc<Pipeline>, ctx: OperationContext) -> Result<String> {
    let key = ctx.key().clone();
    let config = &pipeline.config;

    ctx.check_cancelled()?;
    ctx.set_progress(PROGRESS_CLONING).await;
    let checkout = pipeline.fetcher.fetch(key.url(), key.branch()).await?;
    ctx.check_cancelled()?;

    ctx.set_progress(PROGRESS_SCANNING).await;
    let root = checkout.path().to_path_buf();
    let scan_config = config.clone();
    let scan = tokio::task::spawn_blocking(move || scan_repository(&root, &scan_config))
        .await
        .map_err(|err| AnalysisError::internal(format!("scan task failed: {err}")))??;
    drop(checkout);
    ctx.check_cancelled()?;

    log::info!(
        "{key}: {} files walked, {} digested",
        scan.stats.files,
        scan.digests.len()
    );
    let summary = summarize(&pipeline, &ctx, &key, &scan).await?;
    Ok(render_report(&key, &scan, &summary))
}

async fn summarize(
    pipeline: &Pipeline,
    ctx: &OperationContext,
    key: &OperationKey,
    scan: &RepositoryScan,
) -> Result<String> {
    let config = &pipeline.config;
    let timeout = config.model_timeout();
    let batches = pack_batches(
        scan.digests.iter().map(|digest| digest.render()),
        config.max_prompt_chars,
    );

    let mut part_summaries = Vec::new();
    if batches.len() > 1 {
        let total = batches.len();
        for (idx, batch) in batches.iter().enumerate() {
            ctx.check_cancelled()?;
            ctx.set_progress(format!("Summarizing code (batch {}/{total})", idx + 1))
                .await;
            let prompt = batch_prompt(key, idx + 1, total, batch);
            part_summaries.push(pipeline.model.complete(&prompt, timeout).await);
            ctx.check_cancelled()?;
        }
    }

    let code = match (batches.first(), part_summaries.is_empty()) {
        (None, _) => CodeSection::Empty,
        (Some(only), true) => CodeSection::Digests(only),
        (Some(_), false) => CodeSection::PartSummaries(&part_summaries),
    };
    let prompt = final_prompt(
        &overview(key, &scan.stats, scan.digests.len()),
        scan.readme.as_ref(),
        code,
    );

    ctx.check_cancelled()?;
    ctx.set_progress(PROGRESS_FINAL).await;
    let summary = pipeline.model.complete(&prompt, timeout).await;
    ctx.check_cancelled()?;
    Ok(summary)
}

fn render_report(key: &OperationKey, scan: &RepositoryScan, summary: &str) -> String {
    let mut report = format!("# {} ({})\n\n{}\n", key.url(), key.branch(), summary.trim());
    report.push_str(&format!(
        "\n---\nDigested {} of {} source files ({} lines)",
        scan.digests.len(),
        scan.stats.files,
        scan.stats.total_lines
    ));
    let languages: Vec<String> = scan
        .stats
        .top_languages()
        .iter()
        .take(5)
        .map(|(lang, count)| format!("{lang} {count}"))
        .collect();
    if !languages.is_empty() {
        report.push_str(&format!("; languages: {}", languages.join(", ")));
    }
    report.push('\n');
    report
}
