//! Content hashing - artifact digests and stamp-based skip detection.
//!
//! Uses SHA256 over content rather than mtimes, so a re-run with identical
//! inputs is recognised even when files were touched.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;

/// SHA256 of a single file, as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("Failed to read {} for hashing", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA256 of several byte strings, each length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn hash_parts<I, B>(parts: I) -> String
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        let bytes = part.as_ref();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    format!("{:x}", hasher.finalize())
}

/// Read a cached hash from a stamp file.
/// Returns None if the file doesn't exist or can't be read.
pub fn read_cached_hash(hash_file: &Path) -> Option<String> {
    if !hash_file.exists() {
        return None;
    }
    match fs::read_to_string(hash_file) {
        Ok(s) => Some(s.trim().to_string()),
        Err(e) => {
            tracing::warn!(
                path = %hash_file.display(),
                error = %e,
                "failed to read stamp file, treating as stale"
            );
            None
        }
    }
}

pub fn write_cached_hash(hash_file: &Path, hash: &str) -> Result<()> {
    if let Some(parent) = hash_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(hash_file, hash)
        .with_context(|| format!("Failed to write {}", hash_file.display()))?;
    Ok(())
}

/// True unless the stamp file holds exactly `hash`.
pub fn is_stale(hash: &str, hash_file: &Path) -> bool {
    read_cached_hash(hash_file).as_deref() != Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_is_content_based() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"fuzz").unwrap();
        fs::write(&b, b"fuzz").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());

        let empty = dir.path().join("empty");
        fs::write(&empty, b"").unwrap();
        assert_eq!(
            hash_file(&empty).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_parts_boundaries() {
        assert_ne!(hash_parts(["ab", "c"]), hash_parts(["a", "bc"]));
        assert_eq!(hash_parts(["cmake", "clang"]), hash_parts(["cmake", "clang"]));
    }

    #[test]
    fn test_stamp_roundtrip() {
        let dir = TempDir::new().unwrap();
        let stamp = dir.path().join("nested/.provision.hash");

        assert!(is_stale("abc", &stamp));
        write_cached_hash(&stamp, "abc").unwrap();
        assert!(!is_stale("abc", &stamp));
        assert!(is_stale("abd", &stamp));
    }

    #[test]
    fn test_hash_missing_file_errors() {
        assert!(hash_file(Path::new("/nonexistent/fuzzpack/artifact")).is_err());
    }
}
