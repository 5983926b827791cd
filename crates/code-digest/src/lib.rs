//! # Repolens Code Digest
//!
//! Language-aware line selection that turns arbitrarily large source files into
//! small, prompt-sized digests.
//!
//! ## Philosophy
//!
//! Declarations and comments carry most of the explainable signal per line.
//! The digester keeps those, drops everything else, and marks omitted regions
//! with a `...` separator so a reader never mistakes the digest for contiguous
//! code. No parsing happens here: every decision is made on one trimmed line
//! plus a single bit of block-comment state.
//!
//! ## Architecture
//!
//! ```text
//! Source file
//!     │
//!     ├──> Language Detection (from extension)
//!     │
//!     ├──> Pattern Table lookup (definition rule, comment markers)
//!     │
//!     └──> Line Selector
//!          ├─> Pass 1: flag definitions, comments, block-comment bodies
//!          └─> Pass 2: emit flagged lines, `...` gaps, stop at budget
//! ```
//!
//! ## Example
//!
//! ```rust
//! use repolens_code_digest::{DigestConfig, Digester};
//!
//! let digester = Digester::new(DigestConfig::with_max_lines(10)).unwrap();
//! let digest = digester.digest_str("// header\nclass Foo {\n  fun bar() {}\n}\n", "Foo.kt");
//! assert_eq!(digest.lines, vec!["// header", "class Foo {", "fun bar() { }"]);
//! ```

mod config;
mod digester;
mod error;
mod language;
mod patterns;
mod selector;
mod types;

pub use config::DigestConfig;
pub use digester::Digester;
pub use error::{DigestError, Result};
pub use language::Language;
pub use patterns::{default_patterns, patterns_for, LanguagePatterns};
pub use selector::{normalize_definition, select_lines, GAP_MARKER};
pub use types::FileDigest;
