use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Digest of a single file, ready to be placed in a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// File path (relative to the repository root when produced by a walk)
    pub path: String,

    /// Detected language identifier
    pub language: String,

    /// Selected lines, `...` marking omitted regions
    pub lines: Vec<String>,

    /// Number of lines in the original file
    pub total_lines: usize,
}

impl FileDigest {
    /// Whether the digest holds no lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Approximate rendered size, used for prompt packing
    pub fn rendered_len(&self) -> usize {
        self.path.len()
            + self.language.len()
            + 32
            + self.lines.iter().map(|l| l.len() + 1).sum::<usize>()
    }

    /// Render as a path-headed fenced snippet
    pub fn render(&self) -> String {
        let fence = Language::from_name(&self.language).fence_tag();
        let mut out = String::with_capacity(self.rendered_len());
        out.push_str(&format!(
            "### {} ({}, {} lines)\n```{}\n",
            self.path, self.language, self.total_lines, fence
        ));
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("```\n");
        out
    }
}
