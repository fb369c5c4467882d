//! Editable portrait collection and its collaborators

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use rand::Rng;
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::record::{Category, Payload, Record};

/// Length of generated portrait ids
pub const ID_LENGTH: usize = 10;

/// Source of fresh portrait ids
pub trait IdGenerator {
    fn generate(&mut self) -> String;
}

/// Random ids of lowercase ASCII letters
#[derive(Debug, Clone)]
pub struct AlphaIdGenerator {
    length: usize,
}

impl AlphaIdGenerator {
    pub fn new() -> Self {
        Self::with_length(ID_LENGTH)
    }

    pub fn with_length(length: usize) -> Self {
        Self { length }
    }
}

impl Default for AlphaIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for AlphaIdGenerator {
    fn generate(&mut self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| char::from(b'a' + rng.gen_range(0..26u8)))
            .collect()
    }
}

/// Predictable ids (`<prefix>0`, `<prefix>1`, ...)
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: usize,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Resolves the uploaded image bytes for a record
pub trait PayloadSource {
    fn read_payload(&self, record_id: &str) -> io::Result<Vec<u8>>;
}

/// Payloads read from files on disk, keyed by record id
#[derive(Debug, Clone, Default)]
pub struct FilePayloadSource {
    files: HashMap<String, PathBuf>,
}

impl FilePayloadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record_id: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(record_id.into(), path.into());
    }
}

impl PayloadSource for FilePayloadSource {
    fn read_payload(&self, record_id: &str) -> io::Result<Vec<u8>> {
        let path = self.files.get(record_id).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no image file for portrait {}", record_id),
            )
        })?;
        fs::read(path)
    }
}

/// The user's working list of portraits
#[derive(Debug, Clone, Default)]
pub struct PortraitSet {
    records: Vec<Record>,
}

impl PortraitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty portrait (default category, no image) and return its id
    pub fn create(&mut self, ids: &mut dyn IdGenerator) -> ExportResult<String> {
        let id = ids.generate();
        self.insert(Record::new(id.clone()))?;
        Ok(id)
    }

    /// Add an existing record; ids must be valid and unique
    pub fn insert(&mut self, record: Record) -> ExportResult<()> {
        record.check_id()?;
        if self.get(record.id()).is_some() {
            return Err(ExportError::DuplicateId {
                id: record.id().to_string(),
            });
        }
        debug!(id = record.id(), "portrait added");
        self.records.push(record);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    fn get_mut(&mut self, id: &str) -> ExportResult<&mut Record> {
        self.records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| ExportError::UnknownRecord { id: id.to_string() })
    }

    pub fn set_category(&mut self, id: &str, category: Category) -> ExportResult<()> {
        self.get_mut(id)?.category = category.code().to_string();
        Ok(())
    }

    /// Store uploaded image bytes for a portrait
    pub fn attach_payload(&mut self, id: &str, data: &[u8]) -> ExportResult<()> {
        self.get_mut(id)?.payload = Some(Payload::from_bytes(data));
        Ok(())
    }

    /// Fetch the image for `id` from `source` and attach it
    pub fn load_payload(&mut self, id: &str, source: &dyn PayloadSource) -> ExportResult<()> {
        let data = source.read_payload(id)?;
        self.attach_payload(id, &data)
    }

    /// Remove a portrait, returning it
    pub fn remove(&mut self, id: &str) -> ExportResult<Record> {
        let index = self
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| ExportError::UnknownRecord { id: id.to_string() })?;
        Ok(self.records.remove(index))
    }

    /// Snapshot handed to the exporter
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One log line per portrait
    pub fn summary_lines(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| {
                format!(
                    "ID: {}, Type: {}, Image: {}",
                    r.id(),
                    r.category,
                    if r.has_payload() { "Yes" } else { "No" }
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_alpha_ids() {
        let mut ids = AlphaIdGenerator::new();
        let id = ids.generate();
        assert_eq!(id.len(), ID_LENGTH);
        assert!(id.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIdGenerator::new("p");
        assert_eq!(ids.generate(), "p0");
        assert_eq!(ids.generate(), "p1");
    }

    #[test]
    fn test_create_defaults() {
        let mut set = PortraitSet::new();
        let id = set.create(&mut SequentialIdGenerator::new("p")).unwrap();

        let record = set.get(&id).unwrap();
        assert_eq!(record.category(), Some(Category::Mammalian));
        assert!(!record.has_payload());
        assert_eq!(set.summary_lines(), vec!["ID: p0, Type: MAMMALIAN, Image: No"]);
    }

    #[test]
    fn test_edit_and_remove() {
        let mut ids = SequentialIdGenerator::new("p");
        let mut set = PortraitSet::new();
        let a = set.create(&mut ids).unwrap();
        let b = set.create(&mut ids).unwrap();

        set.set_category(&a, Category::Human).unwrap();
        set.attach_payload(&a, b"DDS ").unwrap();
        assert_eq!(set.get(&a).unwrap().payload_bytes().unwrap(), b"DDS ");
        assert_eq!(set.summary_lines()[0], "ID: p0, Type: HUMAN, Image: Yes");

        let removed = set.remove(&b).unwrap();
        assert_eq!(removed.id(), "p1");
        assert_eq!(set.len(), 1);

        assert!(matches!(set.remove(&b), Err(ExportError::UnknownRecord { .. })));
        assert!(matches!(
            set.set_category("nope", Category::Avian),
            Err(ExportError::UnknownRecord { .. })
        ));
    }

    #[test]
    fn test_duplicate_insert() {
        let mut set = PortraitSet::new();
        set.insert(Record::new("abc")).unwrap();
        assert!(matches!(set.insert(Record::new("abc")), Err(ExportError::DuplicateId { .. })));
    }

    #[test]
    fn test_insert_rejects_invalid_ids() {
        let mut set = PortraitSet::new();
        for bad in ["", "two words", "gfx/escape"] {
            match set.insert(Record::new(bad)) {
                Err(ExportError::InvalidId { id }) => assert_eq!(id, bad),
                other => panic!("unexpected result for {:?}: {:?}", bad, other),
            }
        }
        assert!(set.is_empty());

        let mut ids = AlphaIdGenerator::new();
        for _ in 0..16 {
            set.create(&mut ids).unwrap();
        }
        assert_eq!(set.len(), 16);
    }

    #[test]
    fn test_load_payload_from_file() {
        let mut image = tempfile::NamedTempFile::new().unwrap();
        image.write_all(&[0x44, 0x44, 0x53, 0x20, 0x7C]).unwrap();

        let mut source = FilePayloadSource::new();
        source.insert("abc", image.path());

        let mut set = PortraitSet::new();
        set.insert(Record::new("abc")).unwrap();
        set.load_payload("abc", &source).unwrap();
        assert_eq!(
            set.get("abc").unwrap().payload_bytes().unwrap(),
            vec![0x44, 0x44, 0x53, 0x20, 0x7C]
        );

        set.insert(Record::new("def")).unwrap();
        assert!(matches!(set.load_payload("def", &source), Err(ExportError::Io(_))));
    }
}
