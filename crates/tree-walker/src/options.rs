use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576; // 1 MiB
pub const DEFAULT_BINARY_SNIFF_BYTES: usize = 1000;
pub const DEFAULT_BINARY_ZERO_RATIO: f64 = 0.05;

/// Filtering knobs for a repository walk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Files larger than this are reported as too large and skipped
    pub max_file_bytes: u64,

    /// How many leading bytes are inspected when sniffing for binary content
    pub binary_sniff_bytes: usize,

    /// Fraction of zero bytes above which a file counts as binary
    pub binary_zero_ratio: f64,

    /// Leave out files whose path mentions `test` or `spec`
    pub exclude_tests: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            binary_sniff_bytes: DEFAULT_BINARY_SNIFF_BYTES,
            binary_zero_ratio: DEFAULT_BINARY_ZERO_RATIO,
            exclude_tests: false,
        }
    }
}

impl WalkOptions {
    /// Options used when collecting snippets for a prompt
    pub fn for_snippets() -> Self {
        Self {
            exclude_tests: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_bytes == 0 {
            return Err("max_file_bytes must be > 0".to_string());
        }
        if self.binary_sniff_bytes == 0 {
            return Err("binary_sniff_bytes must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.binary_zero_ratio) {
            return Err(format!(
                "binary_zero_ratio ({}) must be within 0.0..=1.0",
                self.binary_zero_ratio
            ));
        }
        Ok(())
    }
}
