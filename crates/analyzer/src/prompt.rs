//! Prompt construction.
//!
//! Rendered file digests are packed into batches no larger than the prompt
//! budget. A single batch goes straight into the final prompt; several
//! batches are summarized one by one and the partial summaries are combined.

use repolens_protocol::OperationKey;
use repolens_tree_walker::{ReadmeDigest, WalkStats};

const TRUNCATION_NOTE: &str = "... (truncated)\n";

/// Pack rendered snippets into batches of at most `max_chars` bytes each.
///
/// Order is preserved. A snippet that alone exceeds the budget is cut at a
/// character boundary.
pub fn pack_batches<I>(snippets: I, max_chars: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut batches = Vec::new();
    let mut current = String::new();

    for snippet in snippets {
        let snippet = if snippet.len() > max_chars {
            truncate_snippet(&snippet, max_chars)
        } else {
            snippet
        };
        if !current.is_empty() && current.len() + snippet.len() + 1 > max_chars {
            batches.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&snippet);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    let budget = max_chars.saturating_sub(TRUNCATION_NOTE.len() + 1);
    let mut cut = budget.min(snippet.len());
    while !snippet.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = snippet[..cut].to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(TRUNCATION_NOTE);
    out
}

/// Structural overview placed at the top of the final prompt
pub fn overview(key: &OperationKey, stats: &WalkStats, digested: usize) -> String {
    let mut out = format!(
        "Repository: {}\nBranch: {}\nSource files: {} ({} lines)\n",
        key.url(),
        key.branch(),
        stats.files,
        stats.total_lines
    );
    let languages = stats
        .top_languages()
        .iter()
        .map(|(lang, count)| format!("{lang} ({count})"))
        .collect::<Vec<_>>();
    if !languages.is_empty() {
        out.push_str(&format!("Languages: {}\n", languages.join(", ")));
    }
    if digested < stats.files {
        out.push_str(&format!(
            "Digested files: {digested} of {} (remaining files omitted)\n",
            stats.files
        ));
    }
    let skipped = stats.skipped_too_large + stats.skipped_binary + stats.skipped_unreadable;
    if skipped > 0 {
        out.push_str(&format!(
            "Skipped: {} too large, {} binary, {} unreadable\n",
            stats.skipped_too_large, stats.skipped_binary, stats.skipped_unreadable
        ));
    }
    out
}

/// Prompt summarizing one batch of a multi-batch run
pub fn batch_prompt(key: &OperationKey, index: usize, total: usize, batch: &str) -> String {
    format!(
        "You are reviewing part {index} of {total} of the source code of {url} (branch {branch}).\n\
         Each file below is reduced to its declarations and comments; `...` marks omitted lines.\n\
         Describe the responsibilities of these files, the main types and functions, and how \
         they relate. Be concise and factual.\n\n{batch}",
        url = key.url(),
        branch = key.branch(),
    )
}

/// What the final prompt summarizes
pub enum CodeSection<'a> {
    /// The digests themselves (single batch)
    Digests(&'a str),
    /// Summaries of each batch
    PartSummaries(&'a [String]),
    Empty,
}

pub fn final_prompt(overview: &str, readme: Option<&ReadmeDigest>, code: CodeSection<'_>) -> String {
    let mut out = String::from(
        "Write a summary of the software repository described below for a developer who is new \
         to it. Cover its purpose, architecture and main components, key entry points, and \
         notable technologies. Use Markdown with short sections.\n\n",
    );
    out.push_str("## Overview\n");
    out.push_str(overview);
    out.push('\n');

    if let Some(readme) = readme {
        out.push_str("## README excerpt\n");
        out.push_str(&readme.render());
        out.push('\n');
    }

    match code {
        CodeSection::Digests(body) => {
            out.push_str(
                "## Source digests\nEach file is reduced to its declarations and comments; \
                 `...` marks omitted lines.\n\n",
            );
            out.push_str(body);
        }
        CodeSection::PartSummaries(parts) => {
            out.push_str("## Summaries of the source code, part by part\n");
            for (idx, part) in parts.iter().enumerate() {
                out.push_str(&format!("\n### Part {}\n{}\n", idx + 1, part.trim()));
            }
        }
        CodeSection::Empty => {
            out.push_str("## Source digests\nNo source files were found in this repository.\n");
        }
    }
    out
}
