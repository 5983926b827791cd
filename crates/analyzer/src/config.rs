use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "REPOLENS_CONFIG";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SYNC_TIMEOUT_SECS: (u64, u64, u64) = (25, 1, 600);
const MODEL_TIMEOUT_SECS: (u64, u64, u64) = (120, 5, 900);
const CLONE_TIMEOUT_SECS: (u64, u64, u64) = (300, 10, 3600);
const MAX_LINES_PER_FILE: (usize, usize, usize) = (40, 1, 1000);
const MAX_FILES: (usize, usize, usize) = (60, 1, 10_000);
const MAX_PROMPT_CHARS: (usize, usize, usize) = (60_000, 1_000, 2_000_000);
const README_MAX_LINES: (usize, usize, usize) = (120, 0, 10_000);

/// Runtime settings of the analysis pipeline.
///
/// Resolution order: built-in defaults, then the TOML file named by
/// `REPOLENS_CONFIG`, then individual environment variables. Every numeric
/// value is clamped into its supported range.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Seconds `analyze` waits before the run continues in the background
    pub sync_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub clone_timeout_secs: u64,
    pub max_lines_per_file: usize,
    /// Files digested per repository; the rest only count towards the statistics
    pub max_files: usize,
    /// Upper bound on the code section of a single prompt
    pub max_prompt_chars: usize,
    pub readme_max_lines: usize,
    pub include_tests: bool,
    pub model: String,
    pub model_base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sync_timeout_secs: SYNC_TIMEOUT_SECS.0,
            model_timeout_secs: MODEL_TIMEOUT_SECS.0,
            clone_timeout_secs: CLONE_TIMEOUT_SECS.0,
            max_lines_per_file: MAX_LINES_PER_FILE.0,
            max_files: MAX_FILES.0,
            max_prompt_chars: MAX_PROMPT_CHARS.0,
            readme_max_lines: README_MAX_LINES.0,
            include_tests: false,
            model: DEFAULT_MODEL.to_string(),
            model_base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("sync_timeout_secs", &self.sync_timeout_secs)
            .field("model_timeout_secs", &self.model_timeout_secs)
            .field("clone_timeout_secs", &self.clone_timeout_secs)
            .field("max_lines_per_file", &self.max_lines_per_file)
            .field("max_files", &self.max_files)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("readme_max_lines", &self.readme_max_lines)
            .field("include_tests", &self.include_tests)
            .field("model", &self.model)
            .field("model_base_url", &self.model_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AnalyzerConfig {
    /// Defaults, config file and process environment
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AnalysisError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&raw)
            .map_err(|err| AnalysisError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| AnalysisError::Config(err.to_string()))?;
        Ok(config.clamped())
    }

    /// Apply `REPOLENS_*` overrides read through `lookup`, then clamp.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        self.sync_timeout_secs = parse_or(get("REPOLENS_SYNC_TIMEOUT_SECS"), self.sync_timeout_secs);
        self.model_timeout_secs =
            parse_or(get("REPOLENS_MODEL_TIMEOUT_SECS"), self.model_timeout_secs);
        self.clone_timeout_secs =
            parse_or(get("REPOLENS_CLONE_TIMEOUT_SECS"), self.clone_timeout_secs);
        self.max_lines_per_file =
            parse_or(get("REPOLENS_MAX_LINES_PER_FILE"), self.max_lines_per_file);
        self.max_files = parse_or(get("REPOLENS_MAX_FILES"), self.max_files);
        self.max_prompt_chars = parse_or(get("REPOLENS_MAX_PROMPT_CHARS"), self.max_prompt_chars);
        self.readme_max_lines = parse_or(get("REPOLENS_README_MAX_LINES"), self.readme_max_lines);

        if let Some(raw) = get("REPOLENS_INCLUDE_TESTS") {
            match parse_flag(&raw) {
                Some(flag) => self.include_tests = flag,
                None => log::warn!("Ignoring REPOLENS_INCLUDE_TESTS={raw:?}: expected a boolean"),
            }
        }
        if let Some(model) = get("REPOLENS_MODEL") {
            self.model = model;
        }
        if let Some(url) = get("REPOLENS_MODEL_BASE_URL") {
            self.model_base_url = url;
        }
        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.api_key = Some(key);
        }

        *self = self.clone().clamped();
    }

    fn clamped(mut self) -> Self {
        self.sync_timeout_secs = clamp(self.sync_timeout_secs, SYNC_TIMEOUT_SECS);
        self.model_timeout_secs = clamp(self.model_timeout_secs, MODEL_TIMEOUT_SECS);
        self.clone_timeout_secs = clamp(self.clone_timeout_secs, CLONE_TIMEOUT_SECS);
        self.max_lines_per_file = clamp(self.max_lines_per_file, MAX_LINES_PER_FILE);
        self.max_files = clamp(self.max_files, MAX_FILES);
        self.max_prompt_chars = clamp(self.max_prompt_chars, MAX_PROMPT_CHARS);
        self.readme_max_lines = clamp(self.readme_max_lines, README_MAX_LINES);
        self.model_base_url = self.model_base_url.trim_end_matches('/').to_string();
        if self.model.trim().is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        self
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

fn clamp<T: Ord>(value: T, (_, min, max): (T, T, T)) -> T {
    value.clamp(min, max)
}

fn parse_or<T>(raw: Option<String>, current: T) -> T
where
    T: FromStr + Copy,
{
    match raw {
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            log::warn!("Ignoring unparsable value {raw:?}");
            current
        }),
        None => current,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
