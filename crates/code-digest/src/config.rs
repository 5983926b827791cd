use serde::{Deserialize, Serialize};

/// Configuration for digest production
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Maximum lines kept per file, gap markers included
    pub max_lines: usize,

    /// Languages to digest (empty = every language, `unknown` included)
    pub languages: Vec<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_lines: 40,
            languages: vec![],
        }
    }
}

impl DigestConfig {
    /// Config with a specific per-file budget
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            max_lines,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_lines == 0 {
            return Err("max_lines must be > 0".to_string());
        }
        Ok(())
    }

    /// Whether the language identifier passes the language filter
    pub fn accepts(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == language)
    }
}
