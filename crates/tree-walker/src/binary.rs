use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Extensions that are always treated as binary, whatever their content
pub(crate) const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "psd",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar", "war",
    // compiled artifacts
    "exe", "dll", "so", "dylib", "a", "o", "obj", "lib", "class", "pyc", "pyo", "wasm",
    // media / fonts / documents
    "mp3", "mp4", "wav", "ogg", "avi", "mov", "ttf", "otf", "woff", "woff2", "pdf",
    // data blobs
    "bin", "dat", "db", "sqlite", "pb", "onnx",
];

pub fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            BINARY_EXTENSIONS.iter().any(|candidate| *candidate == ext)
        })
        .unwrap_or(false)
}

/// Classify a byte prefix as binary when zero bytes exceed `zero_ratio` of it.
pub fn is_binary_content(prefix: &[u8], zero_ratio: f64) -> bool {
    if prefix.is_empty() {
        return false;
    }
    let zeros = prefix.iter().filter(|b| **b == 0).count();
    (zeros as f64 / prefix.len() as f64) > zero_ratio
}

/// Read at most `sniff_bytes` from the file and apply [`is_binary_content`].
pub fn is_binary_file(path: &Path, sniff_bytes: usize, zero_ratio: f64) -> std::io::Result<bool> {
    let file = File::open(path)?;
    let mut prefix = Vec::with_capacity(sniff_bytes);
    file.take(sniff_bytes as u64).read_to_end(&mut prefix)?;
    Ok(is_binary_content(&prefix, zero_ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn zero_ratio_threshold() {
        let mut bytes = vec![b'a'; 100];
        assert!(!is_binary_content(&bytes, 0.05));
        bytes[..5].fill(0);
        // exactly 5% is not above the threshold
        assert!(!is_binary_content(&bytes, 0.05));
        bytes[5] = 0;
        assert!(is_binary_content(&bytes, 0.05));
        assert!(!is_binary_content(&[], 0.05));
    }

    #[test]
    fn sniff_reads_only_the_prefix() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("mixed.txt");
        let mut data = vec![b'x'; 1000];
        data.extend(std::iter::repeat(0u8).take(4000));
        fs::write(&path, &data).unwrap();

        assert!(!is_binary_file(&path, 1000, 0.05).unwrap());
        assert!(is_binary_file(&path, 2000, 0.05).unwrap());
    }

    #[test]
    fn binary_extensions_are_case_insensitive() {
        assert!(has_binary_extension(Path::new("logo.PNG")));
        assert!(has_binary_extension(Path::new("lib/native.so")));
        assert!(!has_binary_extension(Path::new("main.rs")));
        assert!(!has_binary_extension(Path::new("Makefile")));
    }
}
