//! # Repolens Analyzer
//!
//! Turns a repository URL into a natural-language summary.
//!
//! ```text
//! (repo_url, branch)
//!     │
//!     ├──> RepoFetcher        shallow clone of the branch
//!     ├──> scan_repository    walk, digest, README, statistics
//!     ├──> pack_batches       prompt-sized groups of digests
//!     ├──> ModelClient        one call per batch, then a combining call
//!     └──> OperationManager   caching, background escalation, cancellation
//! ```
//!
//! Collaborators are injected through [`Analyzer::new`]; [`Analyzer::from_config`]
//! wires the production ones (`git` and Gemini).

mod config;
mod error;
mod fetch;
mod model;
mod orchestrator;
mod prompt;
mod scan;

pub use config::{AnalyzerConfig, CONFIG_PATH_ENV, DEFAULT_MODEL, DEFAULT_MODEL_BASE_URL};
pub use error::{AnalysisError, Result};
pub use fetch::{FetchError, FetchedRepo, GitFetcher, RepoFetcher};
pub use model::{model_error_text, GeminiClient, ModelClient, MODEL_ERROR_PREFIX};
pub use orchestrator::{
    operation_key, Analyzer, PROGRESS_CLONING, PROGRESS_FINAL, PROGRESS_SCANNING,
};
pub use prompt::{batch_prompt, final_prompt, overview, pack_batches, CodeSection};
pub use scan::{scan_repository, RepositoryScan};
