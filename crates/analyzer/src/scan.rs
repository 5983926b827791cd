use crate::config::AnalyzerConfig;
use crate::error::Result;
use repolens_code_digest::{DigestConfig, Digester, FileDigest};
use repolens_tree_walker::{
    is_test_path, load_readme, CodeTreeWalker, ReadmeDigest, WalkOptions, WalkStats,
};
use serde::Serialize;
use std::path::Path;

/// Everything the prompts need from a checkout
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryScan {
    pub stats: WalkStats,
    pub readme: Option<ReadmeDigest>,
    pub digests: Vec<FileDigest>,
    /// Eligible files beyond the `max_files` limit
    pub omitted_files: usize,
}

/// Walk `root` once, digest up to `max_files` source files and read the README.
///
/// The statistics cover every source file, test files and files past the
/// limit included; only the digests honour those filters.
/// Blocking; run it on a blocking thread from async code.
pub fn scan_repository(root: &Path, config: &AnalyzerConfig) -> Result<RepositoryScan> {
    let walker = CodeTreeWalker::open(root, WalkOptions::default())?;
    let digester = Digester::new(DigestConfig::with_max_lines(config.max_lines_per_file))?;

    let mut walk = walker.walk();
    let mut digests = Vec::new();
    let mut omitted_files = 0usize;
    let mut skipped_tests = 0usize;
    for file in walk.by_ref() {
        if !config.include_tests && is_test_path(&file.relative_path) {
            skipped_tests += 1;
            continue;
        }
        if digests.len() >= config.max_files {
            omitted_files += 1;
            continue;
        }
        let digest = digester.digest_with_language(&file.content, &file.relative_path, file.language);
        if digest.is_empty() {
            log::debug!("Nothing selected from {}", file.relative_path);
            continue;
        }
        digests.push(digest);
    }
    let stats = walk.into_stats();
    log::info!(
        "Walked {}: {} source files, {} lines, {} digested, {skipped_tests} test files left out",
        root.display(),
        stats.files,
        stats.total_lines,
        digests.len()
    );
    if omitted_files > 0 {
        log::info!("{omitted_files} more files left out by the file limit");
    }

    let readme = if config.readme_max_lines > 0 {
        load_readme(root, config.readme_max_lines)
    } else {
        None
    };

    Ok(RepositoryScan {
        stats,
        readme,
        digests,
        omitted_files,
    })
}
