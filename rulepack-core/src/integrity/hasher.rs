//! Content hashing for emitted artifact trees
//!
//! Uses SHA-256 over the concatenated bytes of every file, visited in sorted
//! path order, so the digest only depends on file contents and layout.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every regular file under `root` (or `root` itself if it is a file),
/// sorted by path
pub fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Hex SHA-256 over all files under `root` in sorted path order
pub fn hash_tree(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    for path in collect_files(root)? {
        feed_file(&mut hasher, &path)?;
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hex SHA-256 of a byte string
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn feed_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;

    let mut buffer = [0; 8192]; // 8KB buffer for streaming
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(())
}
