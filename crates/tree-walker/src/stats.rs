use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structural metadata gathered while walking a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    /// Number of files accepted
    pub files: usize,

    /// Total lines across accepted files
    pub total_lines: usize,

    /// Accepted files per language
    pub languages: BTreeMap<String, usize>,

    /// Files above the size threshold
    pub skipped_too_large: usize,

    /// Files classified as binary
    pub skipped_binary: usize,

    /// Files that passed every filter but could not be read
    pub skipped_unreadable: usize,

    /// Files left out by the test-path filter
    pub skipped_tests: usize,

    /// Read failures, for diagnostics
    pub errors: Vec<String>,
}

impl WalkStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, language: &str, lines: usize) {
        self.files += 1;
        self.total_lines += lines;
        *self.languages.entry(language.to_string()).or_insert(0) += 1;
    }

    pub fn add_error(&mut self, error: String) {
        self.skipped_unreadable += 1;
        self.errors.push(error);
    }

    /// Languages ordered by file count, most common first
    pub fn top_languages(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .languages
            .iter()
            .map(|(lang, count)| (lang.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}
