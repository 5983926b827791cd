use async_trait::async_trait;
use pretty_assertions::assert_eq;
use repolens_analyzer::{
    AnalysisError, Analyzer, AnalyzerConfig, FetchError, FetchedRepo, ModelClient, RepoFetcher,
    MODEL_ERROR_PREFIX,
};
use repolens_operations::OperationManager;
use repolens_protocol::AnalysisResponse;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const URL: &str = "https://github.com/acme/demo";

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Serves a prepared directory instead of cloning
struct FixtureFetcher {
    dir: TempDir,
    calls: AtomicUsize,
    fail: bool,
}

impl FixtureFetcher {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md", "# Demo\n\nA small demo service.\n");
        write(
            dir.path(),
            "src/lib.rs",
            "//! Demo library.\n\npub struct Server;\n\nimpl Server {\n    pub fn start(&self) {\n        run();\n    }\n}\n",
        );
        write(
            dir.path(),
            "src/util.py",
            "import os\n\ndef env(name):\n    return os.environ[name]\n",
        );
        write(dir.path(), "tests/smoke.rs", "#[test]\nfn smoke() {}\n");
        Self {
            dir,
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepoFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, branch: &str) -> Result<FetchedRepo, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::CloneFailed {
                url: url.to_string(),
                branch: branch.to_string(),
                cause: "fatal: Remote branch not found".to_string(),
            });
        }
        Ok(FetchedRepo::Existing(self.dir.path().to_path_buf()))
    }
}

/// Records prompts and answers with a canned reply
struct RecordingModel {
    prompts: Mutex<Vec<String>>,
    delay: Duration,
    reply: String,
}

impl RecordingModel {
    fn new(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            reply: reply.to_string(),
        }
    }

    fn slow(reply: &str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(reply)
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for RecordingModel {
    async fn complete(&self, prompt: &str, _timeout: Duration) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

fn analyzer(
    fetcher: &Arc<FixtureFetcher>,
    model: &Arc<RecordingModel>,
    sync_timeout: Duration,
    config: AnalyzerConfig,
) -> Analyzer {
    Analyzer::new(
        fetcher.clone(),
        model.clone(),
        OperationManager::new(sync_timeout),
        config,
    )
}

#[tokio::test]
async fn completes_and_caches_the_summary() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let model = Arc::new(RecordingModel::new("It is a demo service."));
    let analyzer = analyzer(&fetcher, &model, Duration::from_secs(10), AnalyzerConfig::default());

    let response = analyzer.analyze(URL, None).await;
    let AnalysisResponse::Completed { text } = &response else {
        panic!("expected completion, got {response:?}");
    };
    assert!(text.starts_with("# https://github.com/acme/demo (main)\n\nIt is a demo service.\n"));
    assert!(text.contains("Digested 2 of 3 source files"));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("## README excerpt"));
    assert!(prompt.contains("A small demo service."));
    assert!(prompt.contains("### src/lib.rs (rust, 9 lines)"));
    assert!(prompt.contains("pub struct Server;"));
    assert!(prompt.contains("def env(name):"));
    assert!(!prompt.contains("tests/smoke.rs"));

    let again = analyzer.analyze(&format!("{URL}.git"), Some("main")).await;
    assert_eq!(again, response);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(model.prompts().len(), 1);
    assert_eq!(analyzer.check_status(URL, None).await, response);
}

#[tokio::test]
async fn large_repositories_are_summarized_in_batches() {
    let fetcher = Arc::new(FixtureFetcher::new());
    for i in 0..8 {
        let body: String = (0..6)
            .map(|j| format!("pub fn handler_{i}_{j}() {{\n    work();\n}}\n"))
            .collect();
        write(fetcher.dir.path(), &format!("src/handlers/h{i}.rs"), &body);
    }
    let model = Arc::new(RecordingModel::new("partial"));
    let config = AnalyzerConfig {
        max_prompt_chars: 400,
        ..AnalyzerConfig::default()
    };
    let analyzer = analyzer(&fetcher, &model, Duration::from_secs(10), config);

    let response = analyzer.analyze(URL, Some("dev")).await;
    assert_eq!(response.status(), "completed");

    let prompts = model.prompts();
    assert!(prompts.len() >= 3, "expected several batches, got {}", prompts.len());
    let batch_count = prompts.len() - 1;
    assert!(prompts[0].contains(&format!("part 1 of {batch_count}")));
    assert!(prompts[0].contains("(branch dev)"));

    let last = prompts.last().unwrap();
    assert!(last.contains("## Summaries of the source code, part by part"));
    assert!(last.contains(&format!("### Part {batch_count}\npartial")));
    assert!(!last.contains("pub fn handler_0_0"));
}

#[tokio::test]
async fn fetch_failures_are_recorded() {
    let fetcher = Arc::new(FixtureFetcher::failing());
    let model = Arc::new(RecordingModel::new("unused"));
    let analyzer = analyzer(&fetcher, &model, Duration::from_secs(10), AnalyzerConfig::default());

    let response = analyzer.analyze(URL, Some("release")).await;
    assert!(response.is_error());
    assert!(response.body().contains("Repository fetch failed"));
    assert!(response.body().contains("Remote branch not found"));
    assert_eq!(analyzer.check_status(URL, Some("release")).await, response);
    assert!(model.prompts().is_empty());

    // A failed run can be retried.
    analyzer.analyze(URL, Some("release")).await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn model_errors_do_not_abort_the_run() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let reply = format!("{MODEL_ERROR_PREFIX} HTTP 503 Service Unavailable: overloaded");
    let model = Arc::new(RecordingModel::new(&reply));
    let analyzer = analyzer(&fetcher, &model, Duration::from_secs(10), AnalyzerConfig::default());

    let response = analyzer.analyze(URL, None).await;
    assert_eq!(response.status(), "completed");
    assert!(response.body().contains(&reply));
}

#[tokio::test]
async fn slow_runs_continue_in_background_and_can_be_cancelled() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let model = Arc::new(RecordingModel::slow("late", Duration::from_secs(30)));
    let analyzer = analyzer(&fetcher, &model, Duration::from_millis(200), AnalyzerConfig::default());

    let response = analyzer.analyze(URL, None).await;
    assert_eq!(response.status(), "started");
    assert!(response.body().contains("check_analysis_status"));

    let status = analyzer.check_status(URL, None).await;
    assert_eq!(status.status(), "in_progress");

    let duplicate = analyzer.analyze(URL, None).await;
    assert_eq!(duplicate.status(), "in_progress");
    assert_eq!(fetcher.calls(), 1);

    let cancel = analyzer.cancel(URL, None, false).await.unwrap();
    assert!(cancel.had_running_task);
    assert!(!cancel.had_cached_result);
    assert_eq!(analyzer.check_status(URL, None).await.status(), "cancelled");

    let cleared = analyzer.cancel(URL, None, true).await.unwrap();
    assert!(!cleared.had_running_task);
    assert!(cleared.cache_cleared);
    let status = analyzer.check_status(URL, None).await;
    assert!(status.body().contains("No analysis found"));
}

#[tokio::test]
async fn analyze_to_completion_waits_for_background_runs() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let model = Arc::new(RecordingModel::slow("eventually", Duration::from_millis(300)));
    let analyzer = analyzer(&fetcher, &model, Duration::from_millis(50), AnalyzerConfig::default());

    let response = analyzer.analyze_to_completion(URL, None).await;
    assert_eq!(response.status(), "completed");
    assert!(response.body().contains("eventually"));
}

#[tokio::test]
async fn invalid_requests_start_nothing() {
    let fetcher = Arc::new(FixtureFetcher::new());
    let model = Arc::new(RecordingModel::new("unused"));
    let analyzer = analyzer(&fetcher, &model, Duration::from_secs(10), AnalyzerConfig::default());

    let response = analyzer.analyze("   ", None).await;
    assert_eq!(
        response,
        AnalysisResponse::Error {
            message: "Invalid request: repo_url is required".to_string()
        }
    );
    assert!(matches!(
        analyzer.cancel("", None, true).await,
        Err(AnalysisError::Validation(_))
    ));
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(analyzer.manager().snapshot().await.running, 0);
}
