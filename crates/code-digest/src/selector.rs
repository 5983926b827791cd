//! Two-pass line selection.
//!
//! Pass one flags every line that is a declaration, a comment, or sits inside a
//! block comment. Pass two walks the flagged lines in order, inserting a single
//! [`GAP_MARKER`] wherever lines were skipped, and stops as soon as the line
//! budget is spent.

use crate::patterns::LanguagePatterns;

/// Separator emitted between non-adjacent selected lines.
pub const GAP_MARKER: &str = "...";

/// State threaded through the first pass.
#[derive(Debug, Default, Clone, Copy)]
struct ProcessingState {
    in_comment_block: bool,
    /// Symmetric marker that opened the current block, if any
    open_toggle: Option<&'static str>,
}

impl ProcessingState {
    fn advance(&mut self, trimmed: &str, patterns: &LanguagePatterns) {
        if let Some(marker) = self.open_toggle {
            if trimmed.contains(marker) {
                self.open_toggle = None;
                self.in_comment_block = false;
            }
            return;
        }

        if !self.in_comment_block && self.advance_symmetric(trimmed, patterns.toggle_markers) {
            return;
        }

        let (Some(start), Some(end)) = (patterns.block_comment_start, patterns.block_comment_end)
        else {
            return;
        };

        if trimmed.starts_with(start) && !trimmed.ends_with(end) {
            self.in_comment_block = true;
        } else if trimmed.ends_with(end) {
            self.in_comment_block = false;
        }
    }

    /// Opening and closing delimiters are the same string. A line that opens and
    /// closes on itself (`"""Doc."""`) leaves the state alone; otherwise a line
    /// starting with a marker opens a block that only the same marker closes.
    ///
    /// Returns whether the line started with one of `markers`.
    fn advance_symmetric(&mut self, trimmed: &str, markers: &'static [&'static str]) -> bool {
        let Some(marker) = markers.iter().copied().find(|m| trimmed.starts_with(m)) else {
            return false;
        };
        if !trimmed[marker.len()..].contains(marker) {
            self.open_toggle = Some(marker);
            self.in_comment_block = true;
        }
        true
    }
}

/// Select a bounded, order-preserving digest of `lines`.
///
/// The result never holds more than `max_lines` entries and is a pure function
/// of its inputs.
pub fn select_lines<S: AsRef<str>>(
    lines: &[S],
    patterns: &LanguagePatterns,
    max_lines: usize,
) -> Vec<String> {
    if max_lines == 0 || lines.is_empty() {
        return Vec::new();
    }

    let (include, definitions) = flag_lines(lines, patterns);

    let mut digest = Vec::with_capacity(max_lines.min(lines.len()));
    let mut last_included: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        if !include[idx] {
            continue;
        }
        if digest.len() >= max_lines {
            break;
        }

        let has_gap = last_included.is_some_and(|last| idx != last + 1);
        if has_gap && !digest.is_empty() && digest.len() + 2 <= max_lines {
            digest.push(GAP_MARKER.to_string());
        }

        let trimmed = line.as_ref().trim();
        let rendered = if definitions[idx] {
            normalize_definition(trimmed)
        } else {
            trimmed.to_string()
        };
        digest.push(rendered);
        last_included = Some(idx);
    }

    digest
}

fn flag_lines<S: AsRef<str>>(lines: &[S], patterns: &LanguagePatterns) -> (Vec<bool>, Vec<bool>) {
    let mut state = ProcessingState::default();
    let mut include = Vec::with_capacity(lines.len());
    let mut definitions = Vec::with_capacity(lines.len());

    for line in lines {
        let trimmed = line.as_ref().trim();
        let is_definition = !trimmed.is_empty() && patterns.is_definition(trimmed);
        let is_comment = !trimmed.is_empty() && patterns.is_comment_line(trimmed);

        include.push(is_definition || is_comment || state.in_comment_block);
        definitions.push(is_definition);

        state.advance(trimmed, patterns);
    }

    (include, definitions)
}

/// Render empty bodies (`{}`) as `{ }`; everything else is kept as written.
///
/// A declaration whose brace stays open (`class Foo {`) is not closed, and
/// nothing between a matched pair of braces is dropped.
pub fn normalize_definition(trimmed: &str) -> String {
    let mut normalized = String::with_capacity(trimmed.len() + 2);
    let mut rest = trimmed;
    while let Some(open) = rest.find('{') {
        normalized.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let body = after.trim_start();
        if let Some(tail) = body.strip_prefix('}') {
            normalized.push_str("{ }");
            rest = tail;
        } else {
            normalized.push('{');
            rest = after;
        }
    }
    normalized.push_str(rest);
    normalized
}
