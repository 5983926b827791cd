use crate::binary::{has_binary_extension, is_binary_content};
use crate::error::{Result, WalkError};
use crate::options::WalkOptions;
use crate::stats::WalkStats;
use ignore::{Walk, WalkBuilder};
use repolens_code_digest::Language;
use std::path::{Component, Path, PathBuf};

/// A file that passed every filter, with its content loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Path relative to the walk root, `/`-separated
    pub relative_path: String,
    pub language: Language,
    pub content: String,
}

/// Walker over the source files of a repository checkout
#[derive(Debug, Clone)]
pub struct CodeTreeWalker {
    root: PathBuf,
    options: WalkOptions,
}

impl CodeTreeWalker {
    pub fn new(root: impl AsRef<Path>, options: WalkOptions) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            options,
        }
    }

    /// Like [`CodeTreeWalker::new`], but checks the root and the options up front
    pub fn open(root: impl AsRef<Path>, options: WalkOptions) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(WalkError::InvalidRoot(root.display().to_string()));
        }
        options.validate().map_err(WalkError::InvalidOptions)?;
        Ok(Self::new(root, options))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Lazily enumerate eligible files. Each call starts a fresh walk.
    pub fn walk(&self) -> FileWalk {
        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true) // skip dotfiles and dot-directories
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &root));

        FileWalk {
            inner: builder.build(),
            root: self.root.clone(),
            options: self.options.clone(),
            stats: WalkStats::new(),
        }
    }

    /// Structural metadata for the whole tree. The test-path filter never applies here.
    pub fn collect_stats(&self) -> WalkStats {
        let options = WalkOptions {
            exclude_tests: false,
            ..self.options.clone()
        };
        let mut walk = CodeTreeWalker::new(&self.root, options).walk();
        for _ in walk.by_ref() {}
        log::info!(
            "Walked {}: {} source files, {} lines",
            self.root.display(),
            walk.stats.files,
            walk.stats.total_lines
        );
        walk.into_stats()
    }
}

/// Iterator returned by [`CodeTreeWalker::walk`]
pub struct FileWalk {
    inner: Walk,
    root: PathBuf,
    options: WalkOptions,
    stats: WalkStats,
}

impl FileWalk {
    /// Counters for everything seen so far
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }

    pub fn into_stats(self) -> WalkStats {
        self.stats
    }

    fn screen(&mut self, path: &Path, len: Option<u64>) -> Option<WalkedFile> {
        // Counted as binary before the allow-list would drop them silently.
        if has_binary_extension(path) {
            self.stats.skipped_binary += 1;
            return None;
        }

        let language = source_language(path)?;

        if let Some(len) = len {
            if len > self.options.max_file_bytes {
                log::debug!(
                    "Skipping large file {} ({} bytes > {})",
                    path.display(),
                    len,
                    self.options.max_file_bytes
                );
                self.stats.skipped_too_large += 1;
                return None;
            }
        }

        let relative_path = relative_display(path, &self.root);
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("Failed to read {}: {err}", path.display());
                self.stats.add_error(format!("{relative_path}: {err}"));
                return None;
            }
        };

        // The metadata length can race with concurrent writers; trust what was read.
        if bytes.len() as u64 > self.options.max_file_bytes {
            self.stats.skipped_too_large += 1;
            return None;
        }

        let sniff_len = bytes.len().min(self.options.binary_sniff_bytes);
        if is_binary_content(&bytes[..sniff_len], self.options.binary_zero_ratio) {
            log::debug!("Skipping binary file {}", path.display());
            self.stats.skipped_binary += 1;
            return None;
        }

        if self.options.exclude_tests && is_test_path(&relative_path) {
            self.stats.skipped_tests += 1;
            return None;
        }

        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        };
        self.stats.add_file(language.as_str(), content.lines().count());

        Some(WalkedFile {
            relative_path,
            language,
            content,
        })
    }
}

impl Iterator for FileWalk {
    type Item = WalkedFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("Failed to read entry: {err}");
                    continue;
                }
            };
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let len = entry.metadata().ok().map(|meta| meta.len());
            if let Some(file) = self.screen(entry.path(), len) {
                return Some(file);
            }
        }
    }
}

fn relative_display(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    if let Ok(relative) = path.strip_prefix(root) {
        for component in relative.components() {
            if let Component::Normal(name) = component {
                let lowered = name.to_string_lossy().to_lowercase();
                if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                    return true;
                }
            }
        }
    }
    false
}

/// Language of a file on the source allow-list
fn source_language(path: &Path) -> Option<Language> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(Language::from_supported_extension)
}

/// Case-insensitive `test` / `spec` substring check on the relative path
pub fn is_test_path(relative_path: &str) -> bool {
    let lowered = relative_path.to_lowercase();
    TEST_INDICATORS.iter().any(|marker| lowered.contains(marker))
}

const TEST_INDICATORS: &[&str] = &["test", "spec"];

const IGNORED_SCOPES: &[&str] = &[
    // VCS
    ".git",
    ".hg",
    ".svn",
    // dependencies / build output
    "node_modules",
    "bower_components",
    "vendor",
    "third_party",
    "target",
    "build",
    "dist",
    ".gradle",
    ".next",
    ".nuxt",
    ".venv",
    "venv",
    "__pycache__",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "coverage",
    ".idea",
    ".vscode",
];

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_display(Path::new("/repo/src/lib/mod.rs"), root),
            "src/lib/mod.rs"
        );
    }

    #[test]
    fn test_path_detection() {
        assert!(is_test_path("tests/integration.rs"));
        assert!(is_test_path("src/UserSpec.scala"));
        assert!(is_test_path("pkg/Handler_Test.go"));
        assert!(!is_test_path("src/main.rs"));
    }

    #[test]
    fn skips_ignored_directories() {
        let temp = tempdir().unwrap();
        let vendored = temp.path().join("node_modules").join("left-pad");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(vendored.join("index.js"), b"module.exports = 1;").unwrap();
        let target = temp.path().join("target").join("debug");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("build.rs"), b"fn main() {}").unwrap();
        fs::write(temp.path().join("src.rs"), b"fn main() {}").unwrap();

        let files: Vec<String> = CodeTreeWalker::new(temp.path(), WalkOptions::default())
            .walk()
            .map(|f| f.relative_path)
            .collect();

        assert_eq!(files, vec!["src.rs".to_string()]);
    }

    #[test]
    fn skips_hidden_entries_and_unsupported_extensions() {
        let temp = tempdir().unwrap();
        let hidden = temp.path().join(".github");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("script.sh"), b"echo hi").unwrap();
        fs::write(temp.path().join(".hidden.py"), b"x = 1").unwrap();
        fs::write(temp.path().join("notes.md"), b"# notes").unwrap();
        fs::write(temp.path().join("app.py"), b"def main():\n    pass\n").unwrap();

        let files: Vec<WalkedFile> = CodeTreeWalker::new(temp.path(), WalkOptions::default())
            .walk()
            .collect();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "app.py");
        assert_eq!(files[0].language, Language::Python);
    }

    #[test]
    fn allow_list_follows_language_table() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("tool.gemspec"), b"Gem::Specification.new do |s|\nend\n").unwrap();
        fs::write(temp.path().join("schema.sql"), b"CREATE TABLE t (id INT);\n").unwrap();
        fs::write(temp.path().join("icon.png"), b"\x89PNG\r\n").unwrap();

        let mut walk = CodeTreeWalker::new(temp.path(), WalkOptions::default()).walk();
        let files: Vec<WalkedFile> = walk.by_ref().collect();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "tool.gemspec");
        assert_eq!(files[0].language, Language::Ruby);
        assert_eq!(walk.stats().skipped_binary, 1);
    }

    #[test]
    fn open_rejects_missing_root() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(
            CodeTreeWalker::open(&missing, WalkOptions::default()),
            Err(WalkError::InvalidRoot(_))
        ));
    }
}
