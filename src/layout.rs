//! Bundle layout: which files the game expects and what goes in them

use std::collections::HashSet;

use tracing::debug;

use crate::classify::Classification;
use crate::error::{ExportError, ExportResult};
use crate::record::Record;
use crate::structured::{Mapping, Value, Writer};

/// Portrait set manifest listing every bucket
pub const MANIFEST_PATH: &str = "common/portrait_sets/0_portrait_sets.txt";
/// Folder holding one texture folder per portrait
pub const TEXTURE_DIR: &str = "gfx/models/portraits";
/// Folder holding one gfx config per portrait
pub const CONFIG_DIR: &str = "gfx/portraits/portraits";

/// Portrait groups every portrait is added to
pub const PORTRAIT_GROUPS: [&str; 4] = ["game_setup", "species", "leader", "ruler"];

/// `gfx/models/portraits/<id>/<id>.dds`
pub fn texture_path(id: &str) -> String {
    format!("{}/{}/{}.dds", TEXTURE_DIR, id, id)
}

/// `gfx/portraits/portraits/<id>.txt`
pub fn config_path(id: &str) -> String {
    format!("{}/{}.txt", CONFIG_DIR, id)
}

/// Content of one bundle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    Text(String),
    Binary(Vec<u8>),
}

/// One file of the output bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Forward-slash path relative to the bundle root
    pub path: String,
    pub content: EntryContent,
}

impl ArchiveEntry {
    pub fn text(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: EntryContent::Text(text.into()),
        }
    }

    pub fn binary(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: EntryContent::Binary(data.into()),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.content, EntryContent::Binary(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.content {
            EntryContent::Text(text) => text.as_bytes(),
            EntryContent::Binary(data) => data,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Text(text) => Some(text),
            EntryContent::Binary(_) => None,
        }
    }
}

/// Manifest document: one portrait set per bucket
///
/// ```text
/// humans={
/// 	species_class="HUMAN"
/// 	portraits={ "aaaaaaaaaa" }
/// }
/// ```
pub fn manifest_document(classification: &Classification) -> Mapping {
    let mut document = Mapping::new();
    for bucket in classification.buckets() {
        document.insert(
            bucket.bucket_name(),
            Mapping::new()
                .with("species_class", bucket.category.code())
                .with("portraits", Value::sequence(bucket.member_ids.iter().cloned())),
        );
    }
    document
}

/// Gfx config for one portrait: the texture and its portrait groups
pub fn portrait_config_document(id: &str) -> Mapping {
    let texture = Mapping::new().with("texturefile", texture_path(id));

    let mut group = Mapping::new().with("default", id);
    for name in PORTRAIT_GROUPS {
        let add = Mapping::new().with("portraits", Value::sequence([id]));
        group.insert(name, Mapping::new().with("add", add));
    }

    Mapping::new()
        .with("portraits", Mapping::new().with(id, texture))
        .with("portrait_groups", Mapping::new().with(id, group))
}

/// Builds the list of bundle entries
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    writer: Writer,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_writer(writer: Writer) -> Self {
        Self { writer }
    }

    /// Produce every entry of the bundle.
    ///
    /// Order: manifest, then for each record its texture followed by its config.
    /// Fails on the first invalid or duplicate id or unreadable payload, before
    /// anything is returned.
    pub fn build(
        &self,
        classification: &Classification,
        records: &[Record],
    ) -> ExportResult<Vec<ArchiveEntry>> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            record.check_id()?;
            if !seen.insert(record.id()) {
                return Err(ExportError::DuplicateId {
                    id: record.id().to_string(),
                });
            }
        }

        let mut entries = Vec::with_capacity(1 + records.len() * 2);
        let manifest = self.writer.encode_to_string(&manifest_document(classification))?;
        entries.push(ArchiveEntry::text(MANIFEST_PATH, manifest));

        for record in records {
            let data = record.payload_bytes()?;
            debug!(id = record.id(), bytes = data.len(), "laying out portrait");

            entries.push(ArchiveEntry::binary(texture_path(record.id()), data));
            let config = self.writer.encode_to_string(&portrait_config_document(record.id()))?;
            entries.push(ArchiveEntry::text(config_path(record.id()), config));
        }

        Ok(entries)
    }
}

/// Build entries with the default pretty writer
pub fn build_layout(
    classification: &Classification,
    records: &[Record],
) -> ExportResult<Vec<ArchiveEntry>> {
    LayoutBuilder::new().build(classification, records)
}
