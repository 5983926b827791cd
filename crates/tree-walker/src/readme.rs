use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Extensions accepted for a README, in order of preference
const README_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "adoc", "txt", ""];

/// Leading lines of the repository README
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadmeDigest {
    pub file_name: String,
    pub lines: Vec<String>,
    pub total_lines: usize,
}

impl ReadmeDigest {
    pub fn render(&self) -> String {
        let mut out = format!("### {}\n", self.file_name);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        if self.lines.len() < self.total_lines {
            out.push_str("...\n");
        }
        out
    }
}

/// Locate a `README*` file directly under `root` (case-insensitive).
pub fn find_readme(root: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Failed to list {}: {err}", root.display());
            return None;
        }
    };

    let mut best: Option<(usize, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lowered = name.to_lowercase();
        let Some(rest) = lowered.strip_prefix("readme") else {
            continue;
        };
        let ext = rest.strip_prefix('.').unwrap_or(rest);
        let Some(rank) = README_EXTENSIONS.iter().position(|candidate| *candidate == ext) else {
            continue;
        };
        let better = match &best {
            Some((best_rank, best_path)) => {
                rank < *best_rank || (rank == *best_rank && path < *best_path)
            }
            None => true,
        };
        if better {
            best = Some((rank, path));
        }
    }
    best.map(|(_, path)| path)
}

/// Keep the first `max_lines` meaningful lines: blank lines and badge/image-only
/// lines are dropped, everything else is kept verbatim (right-trimmed).
pub fn readme_digest(content: &str, max_lines: usize) -> Vec<String> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !is_badge_line(line.trim()))
        .take(max_lines)
        .map(str::to_string)
        .collect()
}

/// Find and digest the README under `root`, if any.
pub fn load_readme(root: &Path, max_lines: usize) -> Option<ReadmeDigest> {
    let path = find_readme(root)?;
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("Failed to read {}: {err}", path.display());
            return None;
        }
    };
    let content = String::from_utf8_lossy(&bytes);
    let lines = readme_digest(&content, max_lines);
    Some(ReadmeDigest {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        total_lines: content.lines().filter(|l| !l.trim().is_empty()).count(),
        lines,
    })
}

fn is_badge_line(trimmed: &str) -> bool {
    trimmed.starts_with("[![") || trimmed.starts_with("![") || trimmed.starts_with("<img")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn digest_drops_blanks_and_badges() {
        let content = "# Tool\n\n[![CI](badge.svg)](ci)\n\nDoes things.\n\n## Usage\nrun it\n";
        assert_eq!(
            readme_digest(content, 3),
            vec!["# Tool", "Does things.", "## Usage"]
        );
    }

    #[test]
    fn prefers_markdown_readme() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("README.txt"), "plain").unwrap();
        fs::write(temp.path().join("Readme.md"), "# Title").unwrap();
        fs::write(temp.path().join("README-dev.md"), "# Dev").unwrap();

        let found = find_readme(temp.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "Readme.md");
    }

    #[test]
    fn load_readme_reports_truncation() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("README"), "a\nb\nc\nd\n").unwrap();

        let digest = load_readme(temp.path(), 2).unwrap();
        assert_eq!(digest.file_name, "README");
        assert_eq!(digest.lines, vec!["a", "b"]);
        assert_eq!(digest.total_lines, 4);
        assert_eq!(digest.render(), "### README\na\nb\n...\n");
    }

    #[test]
    fn missing_readme_is_none() {
        let temp = tempdir().unwrap();
        assert!(load_readme(temp.path(), 10).is_none());
    }
}
