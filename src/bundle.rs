//! Packaging of bundle entries
//!
//! A [`Bundle`] is the set of files that make up a portrait mod. It can be
//! written out as a directory tree (the layout the game loads) or as a single
//! txtar file:
//!
//! ```text
//! -- common/portrait_sets/0_portrait_sets.txt --
//! humans={
//! 	species_class="HUMAN"
//! 	portraits={ "aaaaaaaaaa" }
//! }
//!
//! -- gfx/models/portraits/aaaaaaaaaa/aaaaaaaaaa.dds[.base64] --
//! RERTIHwAAAA...
//! ```
//!
//! Binary files, and text files whose content contains a `-- name --` line,
//! are stored base64 encoded with a `[.base64]` suffix on the name. On decode a
//! base64 `.txt` file that is valid UTF-8 comes back as text, the same rule
//! [`Bundle::read_dir`] applies.

use std::fs;
use std::path::{Component, Path};

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use tracing::debug;
use walkdir::WalkDir;

use crate::layout::{ArchiveEntry, EntryContent};

pub const MARKER_PREFIX: &str = "-- ";
pub const MARKER_SUFFIX: &str = " --";
pub const BASE64_SUFFIX: &str = "[.base64]";

/// Default folder for a materialized bundle, the layout the game loads
pub const DEFAULT_BUNDLE_DIR: &str = "stellaris_portraits";

/// Default file name for a single-file bundle
pub const DEFAULT_BUNDLE_NAME: &str = "stellaris_portraits.txtar";

/// Ordered set of bundle files with unique paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    /// Free text written before the first file
    pub comment: String,
    entries: Vec<ArchiveEntry>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comment(comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            ..Default::default()
        }
    }

    /// Collect exported entries
    pub fn from_entries(entries: impl IntoIterator<Item = ArchiveEntry>) -> Result<Self> {
        let mut bundle = Self::new();
        for entry in entries {
            bundle.add(entry)?;
        }
        Ok(bundle)
    }

    /// Add an entry; a path already present is an error
    pub fn add(&mut self, entry: ArchiveEntry) -> Result<()> {
        check_relative(&entry.path)?;
        if self.get(&entry.path).is_some() {
            bail!("Duplicate file: {}", entry.path);
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materialize every entry under `root`, creating folders as needed
    pub fn write_to_dir(&self, root: &Path) -> Result<()> {
        for entry in &self.entries {
            let target = root.join(&entry.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(&target, entry.as_bytes())
                .with_context(|| format!("Failed to write: {}", target.display()))?;
            debug!(path = %target.display(), bytes = entry.as_bytes().len(), "wrote bundle file");
        }
        Ok(())
    }

    /// Load a materialized bundle back from disk.
    ///
    /// `.txt` files that are valid UTF-8 become text entries, everything else
    /// binary. Files are visited in path order.
    pub fn read_dir(root: &Path) -> Result<Self> {
        let mut bundle = Self::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk: {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let data =
                fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
            let relative = path
                .strip_prefix(root)
                .map_err(|_| anyhow!("Failed to get relative path"))?
                .to_string_lossy()
                .replace('\\', "/");

            bundle.add(classify_file(relative, data))?;
        }
        Ok(bundle)
    }

    /// Encode as a single txtar document
    pub fn encode(&self) -> String {
        let mut output = String::new();

        // Terminated like file content: the decoder drops exactly one newline
        if !self.comment.is_empty() {
            output.push_str(&self.comment);
            output.push('\n');
        }

        for entry in &self.entries {
            let text = match &entry.content {
                EntryContent::Text(text) if !contains_marker_line(text) => Some(text.as_str()),
                _ => None,
            };

            output.push_str(MARKER_PREFIX);
            output.push_str(&entry.path);
            match text {
                Some(text) => {
                    output.push_str(MARKER_SUFFIX);
                    output.push('\n');
                    output.push_str(text);
                }
                None => {
                    output.push_str(BASE64_SUFFIX);
                    output.push_str(MARKER_SUFFIX);
                    output.push('\n');
                    let engine = &base64::engine::general_purpose::STANDARD;
                    output.push_str(&engine.encode(entry.as_bytes()));
                }
            }
            // Always terminate; the decoder drops exactly one trailing newline
            output.push('\n');
        }

        output
    }

    pub fn write_txtar(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode())
            .with_context(|| format!("Failed to write: {}", path.display()))
    }

    /// Decode a txtar document produced by [`Bundle::encode`]
    pub fn decode(input: &str) -> Result<Self> {
        let mut bundle = Self::new();
        let mut comment = String::new();
        let mut current: Option<(String, bool, String)> = None;

        for line in input.lines() {
            if let Some((name, is_binary)) = parse_marker(line) {
                if let Some((name, is_binary, data)) = current.take() {
                    bundle.add(finish_entry(name, is_binary, data)?)?;
                }
                current = Some((name, is_binary, String::new()));
                continue;
            }

            match current {
                Some((_, is_binary, ref mut data)) => {
                    if is_binary {
                        data.push_str(line.trim());
                    } else {
                        data.push_str(line);
                        data.push('\n');
                    }
                }
                None => {
                    comment.push_str(line);
                    comment.push('\n');
                }
            }
        }

        if let Some((name, is_binary, data)) = current.take() {
            bundle.add(finish_entry(name, is_binary, data)?)?;
        }

        if comment.ends_with('\n') {
            comment.pop();
        }
        bundle.comment = comment;
        Ok(bundle)
    }

    pub fn read_txtar(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?;
        Self::decode(&content)
    }
}

/// `.txt` files that are valid UTF-8 are text, everything else binary
fn classify_file(path: String, data: Vec<u8>) -> ArchiveEntry {
    if !path.ends_with(".txt") {
        return ArchiveEntry::binary(path, data);
    }
    match String::from_utf8(data) {
        Ok(text) => ArchiveEntry::text(path, text),
        Err(e) => ArchiveEntry::binary(path, e.into_bytes()),
    }
}

fn finish_entry(name: String, is_binary: bool, mut data: String) -> Result<ArchiveEntry> {
    if is_binary {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&data)
            .map_err(|e| anyhow!("Failed to decode base64 for file '{}': {}", name, e))?;
        Ok(classify_file(name, decoded))
    } else {
        if data.ends_with('\n') {
            data.pop();
        }
        Ok(ArchiveEntry::text(name, data))
    }
}

/// `-- name --` or `-- name[.base64] --`
fn parse_marker(line: &str) -> Option<(String, bool)> {
    let name = line.strip_prefix(MARKER_PREFIX)?.strip_suffix(MARKER_SUFFIX)?;
    if name.trim().is_empty() {
        return None;
    }
    match name.strip_suffix(BASE64_SUFFIX) {
        Some(base) => Some((base.to_string(), true)),
        None => Some((name.to_string(), false)),
    }
}

fn contains_marker_line(text: &str) -> bool {
    text.lines().any(|line| parse_marker(line.trim()).is_some())
}

/// Entry paths must stay inside the bundle root
fn check_relative(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("Empty file path");
    }
    let ok = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !ok {
        bail!("File path escapes the bundle root: {}", path);
    }
    Ok(())
}
