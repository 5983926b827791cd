use crate::config::DigestConfig;
use crate::error::{DigestError, Result};
use crate::language::Language;
use crate::patterns::patterns_for;
use crate::selector::select_lines;
use crate::types::FileDigest;
use std::path::Path;

/// Main digest interface for processing source files
#[derive(Debug, Clone)]
pub struct Digester {
    config: DigestConfig,
}

impl Digester {
    /// Create a new digester, rejecting invalid configuration
    pub fn new(config: DigestConfig) -> Result<Self> {
        config.validate().map_err(DigestError::invalid_config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Digest code from a string; the language comes from the path
    pub fn digest_str(&self, content: &str, file_path: &str) -> FileDigest {
        self.digest_with_language(content, file_path, Language::from_path(file_path))
    }

    /// Digest code from a file
    pub fn digest_file(&self, path: impl AsRef<Path>) -> Result<FileDigest> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes)
            .map_err(|_| DigestError::NotUtf8(path.display().to_string()))?;
        Ok(self.digest_str(&content, &path.to_string_lossy()))
    }

    /// Digest code with explicit language
    pub fn digest_with_language(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> FileDigest {
        let lines: Vec<&str> = content.lines().collect();
        let selected = if self.config.accepts(language.as_str()) {
            select_lines(&lines, patterns_for(language), self.config.max_lines)
        } else {
            log::debug!("Skipping digest for {file_path}: language {language} filtered out");
            Vec::new()
        };

        FileDigest {
            path: file_path.to_string(),
            language: language.as_str().to_string(),
            lines: selected,
            total_lines: lines.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_zero_budget() {
        assert!(Digester::new(DigestConfig::with_max_lines(0)).is_err());
    }

    #[test]
    fn digest_str_detects_language() {
        let digester = Digester::new(DigestConfig::default()).unwrap();
        let digest = digester.digest_str("import os\n\nx = 1\ndef main():\n    pass\n", "tool.py");
        assert_eq!(digest.language, "python");
        assert_eq!(digest.lines, vec!["import os", "...", "def main():"]);
        assert_eq!(digest.total_lines, 5);
    }

    #[test]
    fn filtered_language_yields_empty_digest() {
        let config = DigestConfig {
            languages: vec!["rust".to_string()],
            ..Default::default()
        };
        let digester = Digester::new(config).unwrap();
        let digest = digester.digest_str("def main():\n    pass\n", "tool.py");
        assert!(digest.is_empty());
        assert_eq!(digest.total_lines, 2);
    }

    #[test]
    fn digest_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package main\n\n// entry\nfunc main() {\n}\n").unwrap();

        let digester = Digester::new(DigestConfig::default()).unwrap();
        let digest = digester.digest_file(&path).unwrap();
        assert_eq!(digest.language, "go");
        assert_eq!(digest.lines, vec!["package main", "...", "// entry", "func main() {"]);
    }

    #[test]
    fn digest_file_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.rs");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let digester = Digester::new(DigestConfig::default()).unwrap();
        assert!(matches!(
            digester.digest_file(&path),
            Err(DigestError::NotUtf8(_))
        ));
    }
}
