//! Manifest patching.
//!
//! The upstream fuzz harness ships a feature declaration that the nightly
//! toolchain's manifest parser rejects. Before building, that declaration
//! is removed from the staged `Cargo.toml`. Absence of the declaration is
//! normal and leaves the file untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml_edit::{DocumentMut, ImDocument, Item};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to replace manifest {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("manifest is not valid TOML: {0}")]
    Parse(#[from] toml_edit::TomlError),
    #[error("patched manifest is no longer valid TOML: {0}")]
    InvalidResult(toml_edit::TomlError),
}

/// A declaration to remove: `key = [value...]` inside `[table]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPatch {
    pub table: String,
    pub key: String,
    pub value: Vec<String>,
}

impl Default for ManifestPatch {
    fn default() -> Self {
        Self {
            table: "features".to_string(),
            key: "serde".to_string(),
            value: vec!["smallvec/serde".to_string(), "cssparser/serde".to_string()],
        }
    }
}

impl ManifestPatch {
    /// The declaration as it appears on a manifest line,
    /// e.g. `serde = ["smallvec/serde", "cssparser/serde"]`.
    pub fn declaration(&self) -> String {
        let values: Vec<String> = self.value.iter().map(|v| format!("\"{}\"", v)).collect();
        format!("{} = [{}]", self.key, values.join(", "))
    }

    fn matches(&self, item: &Item) -> bool {
        let Some(array) = item.as_array() else {
            return false;
        };
        array.len() == self.value.len()
            && array
                .iter()
                .zip(&self.value)
                .all(|(have, want)| have.as_str() == Some(want.as_str()))
    }
}

/// How the declaration is located and removed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PatchStrategy {
    /// Parse the TOML document and remove the key from its table.
    #[default]
    Structured,
    /// Drop every line equal to the rendered declaration.
    LineFilter,
}

impl std::str::FromStr for PatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "structured" => Ok(Self::Structured),
            "line-filter" => Ok(Self::LineFilter),
            other => Err(format!(
                "unknown patch strategy '{}' (expected 'structured' or 'line-filter')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The declaration was not present. Nothing was written.
    Unchanged,
    Removed { text: String, lines_removed: usize },
}

impl PatchOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Apply `patch` to manifest text.
pub fn patch_text(
    text: &str,
    patch: &ManifestPatch,
    strategy: PatchStrategy,
) -> Result<PatchOutcome, ManifestError> {
    let patched = match strategy {
        PatchStrategy::Structured => remove_structured(text, patch)?,
        PatchStrategy::LineFilter => remove_lines(text, patch),
    };

    let Some(patched) = patched else {
        return Ok(PatchOutcome::Unchanged);
    };

    patched
        .parse::<DocumentMut>()
        .map_err(ManifestError::InvalidResult)?;

    let lines_removed = text.lines().count().saturating_sub(patched.lines().count());
    Ok(PatchOutcome::Removed {
        text: patched,
        lines_removed,
    })
}

/// Apply `patch` to the manifest at `path`, replacing it atomically.
///
/// When the declaration is absent the file is not rewritten.
pub fn patch_file(
    path: &Path,
    patch: &ManifestPatch,
    strategy: PatchStrategy,
) -> Result<PatchOutcome, ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let outcome = patch_text(&text, patch, strategy)?;
    if let PatchOutcome::Removed { text, .. } = &outcome {
        replace_atomically(path, text.as_bytes()).map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(outcome)
}

/// Whether the manifest currently carries the declaration.
pub fn contains_declaration(text: &str, patch: &ManifestPatch) -> Result<bool, ManifestError> {
    let doc = ImDocument::parse(text)?;
    Ok(doc
        .get(&patch.table)
        .and_then(Item::as_table_like)
        .and_then(|table| table.get(&patch.key))
        .is_some_and(|item| patch.matches(item)))
}

fn remove_structured(text: &str, patch: &ManifestPatch) -> Result<Option<String>, ManifestError> {
    let doc = ImDocument::parse(text)?;

    let Some(table) = doc.get(&patch.table).and_then(Item::as_table_like) else {
        return Ok(None);
    };
    let Some((key, item)) = table.get_key_value(&patch.key) else {
        return Ok(None);
    };
    if !patch.matches(item) {
        tracing::warn!(
            table = %patch.table,
            key = %patch.key,
            "declaration present with a different value, leaving it in place"
        );
        return Ok(None);
    }

    // Entries on their own lines are cut out of the original text so every
    // other byte survives. Anything else goes through a full re-serialize.
    let spliced = match (key.span(), item.span()) {
        (Some(k), Some(v)) => splice_lines(text, k.start, v.end),
        _ => None,
    };
    if spliced.is_some() {
        return Ok(spliced);
    }

    let mut doc: DocumentMut = text.parse()?;
    if let Some(table) = doc
        .get_mut(&patch.table)
        .and_then(Item::as_table_like_mut)
    {
        table.remove(&patch.key);
    }
    Ok(Some(doc.to_string()))
}

/// Remove the whole lines covering `start..end`, or `None` if other
/// content shares those lines.
fn splice_lines(text: &str, start: usize, end: usize) -> Option<String> {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    if !text[line_start..start].trim().is_empty() {
        return None;
    }

    let rest = &text[end..];
    let (tail, line_end) = match rest.find('\n') {
        Some(i) => (&rest[..i], end + i + 1),
        None => (rest, text.len()),
    };
    let tail = tail.trim();
    if !(tail.is_empty() || tail.starts_with('#')) {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..line_start]);
    out.push_str(&text[line_end..]);
    Some(out)
}

fn remove_lines(text: &str, patch: &ManifestPatch) -> Option<String> {
    let declaration = patch.declaration();
    let mut removed = 0usize;

    let kept: String = text
        .split_inclusive('\n')
        .filter(|line| {
            let hit = line.trim() == declaration;
            if hit {
                removed += 1;
            }
            !hit
        })
        .collect();

    (removed > 0).then_some(kept)
}

/// Write to a temp file next to `path`, then rename over it.
fn replace_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    fs::set_permissions(tmp.path(), fs::metadata(path)?.permissions())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
