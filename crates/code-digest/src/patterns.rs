use crate::language::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Per-language rules used by the line selector.
///
/// Entries are built once and shared by every selection call.
#[derive(Debug)]
pub struct LanguagePatterns {
    /// Matches trimmed lines that introduce a declaration (types, functions, imports).
    pub definition: Regex,
    /// Line-comment markers, checked in order.
    pub comment_prefixes: &'static [&'static str],
    /// Opening block-comment delimiter, if the language has one.
    pub block_comment_start: Option<&'static str>,
    /// Closing block-comment delimiter, if the language has one.
    pub block_comment_end: Option<&'static str>,
    /// Delimiters that both open and close a block (Python docstrings).
    pub toggle_markers: &'static [&'static str],
}

impl LanguagePatterns {
    fn new(
        definition: &str,
        comment_prefixes: &'static [&'static str],
        block: Option<(&'static str, &'static str)>,
    ) -> Self {
        Self {
            definition: Regex::new(definition)
                .unwrap_or_else(|err| panic!("invalid definition pattern {definition:?}: {err}")),
            comment_prefixes,
            block_comment_start: block.map(|(start, _)| start),
            block_comment_end: block.map(|(_, end)| end),
            toggle_markers: &[],
        }
    }

    fn with_toggle_markers(mut self, markers: &'static [&'static str]) -> Self {
        self.toggle_markers = markers;
        self
    }

    /// Look up patterns by language identifier; unknown identifiers get the default entry.
    pub fn lookup(language_id: &str) -> &'static LanguagePatterns {
        patterns_for(Language::from_name(language_id))
    }

    /// Whether the trimmed line introduces a declaration.
    pub fn is_definition(&self, trimmed: &str) -> bool {
        self.definition.is_match(trimmed)
    }

    /// Whether the trimmed line is (part of) a comment on its own.
    pub fn is_comment_line(&self, trimmed: &str) -> bool {
        self.comment_prefixes
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
            || self
                .block_comment_start
                .is_some_and(|start| trimmed.starts_with(start))
            || self
                .toggle_markers
                .iter()
                .any(|marker| trimmed.starts_with(marker))
            || trimmed.starts_with('*')
            || trimmed.starts_with("/**")
            || trimmed.starts_with("**/")
    }
}

const C_STYLE_COMMENTS: &[&str] = &["//"];
const HASH_COMMENTS: &[&str] = &["#"];
const PHP_COMMENTS: &[&str] = &["//", "#"];
const DEFAULT_COMMENTS: &[&str] = &["//", "#", "--", ";"];

const C_BLOCK: Option<(&str, &str)> = Some(("/*", "*/"));
const PYTHON_DOCSTRINGS: &[&str] = &[r#"""""#, "'''"];

static TABLE: Lazy<HashMap<Language, LanguagePatterns>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        Language::Rust,
        LanguagePatterns::new(
            r#"^(?:pub(?:\([^)]*\))?\s+)?(?:(?:async|const|unsafe|default|extern(?:\s+"[^"]*")?)\s+)*(?:fn|struct|enum|trait|impl|type|const|static|mod|use|union)\b|^extern\s+crate\b|^macro_rules!|^#\[derive"#,
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Python,
        LanguagePatterns::new(
            r"^(?:(?:async\s+)?def\s|class\s|import\s|from\s+\S+\s+import\s|@\w)",
            HASH_COMMENTS,
            None,
        )
        .with_toggle_markers(PYTHON_DOCSTRINGS),
    );
    let js_like = r"^(?:export\s+(?:default\s+)?)?(?:(?:async\s+)?function\b|(?:abstract\s+)?class\b|interface\b|type\s+\w+|enum\b|namespace\b|declare\b|import\b|(?:const|let|var)\s+\w+\s*=\s*(?:async\s*)?(?:\([^)]*\)|\w+)\s*=>)|^module\.exports\b";
    table.insert(
        Language::JavaScript,
        LanguagePatterns::new(js_like, C_STYLE_COMMENTS, C_BLOCK),
    );
    table.insert(
        Language::TypeScript,
        LanguagePatterns::new(js_like, C_STYLE_COMMENTS, C_BLOCK),
    );
    table.insert(
        Language::Go,
        LanguagePatterns::new(
            r"^(?:package|import|func|type|var|const)\b",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Java,
        LanguagePatterns::new(
            r"^(?:import|package)\b|^@interface\b|^(?:(?:public|private|protected|static|final|abstract|sealed|non-sealed|strictfp)\s+)*(?:class|interface|enum|record)\b|^(?:(?:public|private|protected|static|final|abstract|synchronized|native|default)\s+)+[\w<>\[\],.?\s]+\s+\w+\s*\(",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Kotlin,
        LanguagePatterns::new(
            r"^(?:import|package)\b|^(?:(?:public|private|protected|internal|open|abstract|sealed|data|inline|value|override|suspend|enum|annotation|companion|inner|lateinit|const)\s+)*(?:class|interface|object|fun|val|var|typealias)\b",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::C,
        LanguagePatterns::new(
            r"^#\s*(?:include|define)\b|^(?:struct|enum|union|typedef)\b|^(?:(?:static|inline|extern|const|unsigned|signed)\s+)*[A-Za-z_]\w*[\s\*]+\**[A-Za-z_]\w*\s*\([^;]*$",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Cpp,
        LanguagePatterns::new(
            r"^#\s*(?:include|define)\b|^(?:class|struct|enum|union|namespace|template|typedef|using)\b|^(?:(?:static|inline|extern|virtual|constexpr|const|unsigned|signed|explicit)\s+)*[A-Za-z_][\w:<>]*[\s\*&]+[\*&]*[A-Za-z_~][\w:]*\s*\([^;]*$",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::CSharp,
        LanguagePatterns::new(
            r"^(?:using|namespace)\b|^(?:(?:public|private|protected|internal|static|sealed|abstract|partial|readonly|unsafe)\s+)*(?:class|interface|struct|enum|record|delegate)\b|^(?:(?:public|private|protected|internal|static|async|override|virtual|abstract|sealed)\s+)+[\w<>\[\],.?\s]+\s+\w+\s*\(",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Ruby,
        LanguagePatterns::new(
            r"^(?:def|class|module|require|require_relative|include|extend|attr_reader|attr_writer|attr_accessor)\b",
            HASH_COMMENTS,
            Some(("=begin", "=end")),
        ),
    );
    table.insert(
        Language::Swift,
        LanguagePatterns::new(
            r"^import\b|^(?:(?:@\w+|public|private|internal|fileprivate|open|final|static|override|mutating)\s+)*(?:class|struct|enum|protocol|extension|func|actor|typealias)\b",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Php,
        LanguagePatterns::new(
            r"^<\?php\b|^(?:namespace|use)\b|^(?:(?:abstract|final|public|private|protected|static|readonly)\s+)*(?:class|interface|trait|function|enum)\b",
            PHP_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Scala,
        LanguagePatterns::new(
            r"^(?:package|import)\b|^(?:(?:private|protected|final|sealed|abstract|implicit|override|case|lazy)\s+)*(?:class|object|trait|def|val|type|enum|given)\b",
            C_STYLE_COMMENTS,
            C_BLOCK,
        ),
    );
    table.insert(
        Language::Shell,
        LanguagePatterns::new(
            r"^function\s+\w+|^\w[\w-]*\s*\(\)|^export\s+\w+=|^(?:source|\.)\s+\S",
            HASH_COMMENTS,
            None,
        ),
    );
    table
});

static DEFAULT_PATTERNS: Lazy<LanguagePatterns> = Lazy::new(|| {
    LanguagePatterns::new(
        r"^(?:class|def|fn|func|function|import|struct|interface|module|package)\b",
        DEFAULT_COMMENTS,
        C_BLOCK,
    )
});

/// Total lookup: every language has one entry, `Unknown` shares the default.
pub fn patterns_for(language: Language) -> &'static LanguagePatterns {
    TABLE.get(&language).unwrap_or(&*DEFAULT_PATTERNS)
}

/// The shared fallback entry.
pub fn default_patterns() -> &'static LanguagePatterns {
    &DEFAULT_PATTERNS
}
