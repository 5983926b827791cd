//! # Repolens Tree Walker
//!
//! Enumerates the source files of a repository checkout.
//!
//! ## Pipeline
//!
//! ```text
//! Directory
//!     │
//!     ├──> Ignore rules (hidden entries, VCS / dependency / build dirs, .gitignore)
//!     ├──> Extension allow-list
//!     ├──> Size threshold (default 1 MiB)
//!     ├──> Binary screening (extension set, zero-byte sniffing)
//!     └──> Optional test-path filter
//!            └─> WalkedFile { relative_path, language, content }
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use repolens_tree_walker::{CodeTreeWalker, WalkOptions};
//!
//! let walker = CodeTreeWalker::open("/path/to/checkout", WalkOptions::for_snippets())?;
//! for file in walker.walk() {
//!     println!("{} ({})", file.relative_path, file.language);
//! }
//! # Ok::<(), repolens_tree_walker::WalkError>(())
//! ```

mod binary;
mod error;
mod options;
mod readme;
mod stats;
mod walker;

pub use binary::{has_binary_extension, is_binary_content, is_binary_file};
pub use error::{Result, WalkError};
pub use options::{
    WalkOptions, DEFAULT_BINARY_SNIFF_BYTES, DEFAULT_BINARY_ZERO_RATIO, DEFAULT_MAX_FILE_BYTES,
};
pub use readme::{find_readme, load_readme, readme_digest, ReadmeDigest};
pub use stats::WalkStats;
pub use walker::{is_test_path, CodeTreeWalker, FileWalk, WalkedFile};
