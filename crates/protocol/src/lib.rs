use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_BRANCH: &str = "main";

/// Identifies one (repository, branch) analysis target.
///
/// Construction canonicalises both parts so equal targets always produce the
/// same key: surrounding whitespace, trailing slashes and a trailing `.git` are
/// dropped from the URL, and a blank branch becomes [`DEFAULT_BRANCH`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationKey {
    url: String,
    branch: String,
}

impl OperationKey {
    pub fn new(url: &str, branch: Option<&str>) -> Self {
        let mut url = url.trim().trim_end_matches('/');
        if let Some(stripped) = url.strip_suffix(".git") {
            url = stripped.trim_end_matches('/');
        }
        let branch = branch
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BRANCH);
        Self {
            url: url.to_string(),
            branch: branch.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.url, self.branch)
    }
}

/// Result of `analyze` and `check_status`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisResponse {
    /// Analysis finished; `text` is the report.
    Completed { text: String },
    /// Analysis escalated to the background.
    Started { message: String },
    /// A run for this key is still active.
    InProgress { progress: String },
    /// Validation, fetch or internal failure.
    Error { message: String },
    /// The run was cancelled by a caller.
    Cancelled { message: String },
}

impl AnalysisResponse {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Started { .. } => "started",
            Self::InProgress { .. } => "in_progress",
            Self::Error { .. } => "error",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    /// The human-readable payload, whichever variant this is.
    pub fn body(&self) -> &str {
        match self {
            Self::Completed { text } => text,
            Self::Started { message } | Self::Error { message } | Self::Cancelled { message } => {
                message
            }
            Self::InProgress { progress } => progress,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Result of `cancel`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct CancelResponse {
    pub message: String,
    /// A run was active and has been signalled.
    pub had_running_task: bool,
    /// A completed result existed when the call arrived.
    pub had_cached_result: bool,
    /// The stored result was removed.
    pub cache_cleared: bool,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
