//! Work directory layout and filesystem helpers.
//!
//! ```text
//! <work_dir>/
//!   builder/src/        staged source tree (builder stage)
//!   runtime/            image root (runtime stage)
//!   .runtime.partial/   export staging, renamed to runtime/ on success
//!   runtime.json        image record
//!   .provision.hash     provisioning stamp
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct Layout {
    pub work_dir: PathBuf,
}

impl Layout {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub fn builder(&self) -> PathBuf {
        self.work_dir.join("builder")
    }

    pub fn builder_src(&self) -> PathBuf {
        self.builder().join("src")
    }

    /// The runtime image root: an artifact exported as `/name` lands at
    /// `runtime/name`.
    pub fn runtime(&self) -> PathBuf {
        self.work_dir.join("runtime")
    }

    pub fn runtime_staging(&self) -> PathBuf {
        self.work_dir.join(".runtime.partial")
    }

    pub fn image_record(&self) -> PathBuf {
        self.work_dir.join("runtime.json")
    }

    pub fn provision_stamp(&self) -> PathBuf {
        self.work_dir.join(".provision.hash")
    }
}

/// Remove `dir` if present and create it empty.
pub fn prepare_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(())
}

/// Remove a directory tree, ignoring absence.
pub fn remove_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", dir.display())),
    }
}

/// Remove a file, ignoring absence.
pub fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Copy the tree at `src` into `dest` verbatim.
///
/// Files keep their permissions and symlinks are recreated, not followed.
/// Entries under any of `skip` are left out (used so a work directory that
/// lives inside the source tree is not copied into itself).
pub fn copy_tree(src: &Path, dest: &Path, skip: &[PathBuf]) -> Result<u64> {
    let mut copied = 0u64;

    let walker = WalkDir::new(src).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| !skip.iter().any(|s| e.path().starts_with(s))) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("{} escaped {}", entry.path().display(), src.display()))?;
        let target = dest.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())
                .with_context(|| format!("Failed to read link {}", entry.path().display()))?;
            std::os::unix::fs::symlink(&link, &target)
                .with_context(|| format!("Failed to create link {}", target.display()))?;
            copied += 1;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_preserves_everything() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(src.join("fuzz/fuzz_targets")).unwrap();
        fs::write(src.join("Cargo.toml"), "[package]\n").unwrap();
        fs::write(src.join("fuzz/fuzz_targets/parser.rs"), "fn main() {}\n").unwrap();
        fs::write(src.join("build.sh"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(src.join("build.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink("Cargo.toml", src.join("link.toml")).unwrap();

        let copied = copy_tree(&src, &dest, &[]).unwrap();

        assert_eq!(copied, 4);
        assert_eq!(
            fs::read_to_string(dest.join("fuzz/fuzz_targets/parser.rs")).unwrap(),
            "fn main() {}\n"
        );
        let mode = fs::metadata(dest.join("build.sh")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(
            fs::read_link(dest.join("link.toml")).unwrap(),
            PathBuf::from("Cargo.toml")
        );
    }

    #[test]
    fn test_copy_tree_skips_work_dir() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let work = src.join(".fuzzpack");
        fs::create_dir_all(work.join("builder")).unwrap();
        fs::write(work.join("builder/stale"), "x").unwrap();
        fs::write(src.join("Cargo.toml"), "").unwrap();

        let dest = tmp.path().join("dest");
        copy_tree(&src, &dest, &[work]).unwrap();

        assert!(dest.join("Cargo.toml").exists());
        assert!(!dest.join(".fuzzpack").exists());
    }

    #[test]
    fn test_prepare_dir_empties() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("runtime");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("old"), "x").unwrap();

        prepare_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        remove_dir(&tmp.path().join("absent")).unwrap();
        remove_file(&tmp.path().join("absent.json")).unwrap();
    }

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new("/w");
        assert_eq!(layout.builder_src(), PathBuf::from("/w/builder/src"));
        assert_eq!(layout.runtime(), PathBuf::from("/w/runtime"));
        assert_eq!(layout.image_record(), PathBuf::from("/w/runtime.json"));
    }
}
