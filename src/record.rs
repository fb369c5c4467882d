//! Portrait records and the category table

use base64::Engine;

use crate::error::{ExportError, ExportResult, RecordIssue};

/// Species class a portrait belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Human,
    Machine,
    #[default]
    Mammalian,
    Reptilian,
    Avian,
    Arthropoid,
    Molluscoid,
    Fungoid,
    Plantoid,
    Lithoid,
    Necroid,
    Aquatic,
    Toxoid,
    Cybernetic,
    Synthetic,
    Biogenesis,
    Psionic,
    Infernal,
}

/// One row of the category table
struct CategoryInfo {
    category: Category,
    code: &'static str,
    bucket: &'static str,
    /// Bucket name not confirmed against the game files
    provisional: bool,
}

// Bucket names are consumed by the game as-is; keep the provisional ones unchanged
// until the real portrait set names are confirmed.
const CATEGORY_TABLE: [CategoryInfo; 18] = [
    row(Category::Human, "HUMAN", "humans", false),
    row(Category::Machine, "MACHINE", "machines", false),
    row(Category::Mammalian, "MAMMALIAN", "mammalians", false),
    row(Category::Reptilian, "REPTILIAN", "reptilians", false),
    row(Category::Avian, "AVIAN", "avians", false),
    row(Category::Arthropoid, "ARTHROPOID", "arthropoids", false),
    row(Category::Molluscoid, "MOLLUSCOID", "molluscoids", false),
    row(Category::Fungoid, "FUNGOID", "fungoids", false),
    row(Category::Plantoid, "PLANTOID", "plantoids", false),
    row(Category::Lithoid, "LITHOID", "lithoids", false),
    row(Category::Necroid, "NECROID", "necroids", false),
    row(Category::Aquatic, "AQUATIC", "aquatics", false),
    row(Category::Toxoid, "TOXOID", "toxoids", false),
    row(Category::Cybernetic, "CYBERNETIC", "cybernetics", true),
    row(Category::Synthetic, "SYNTHETIC", "synthetics", true),
    row(Category::Biogenesis, "BIOGENESIS", "biogenesis", true),
    row(Category::Psionic, "PSIONIC", "psionics", true),
    row(Category::Infernal, "INFERNAL", "infernals", false),
];

const fn row(
    category: Category,
    code: &'static str,
    bucket: &'static str,
    provisional: bool,
) -> CategoryInfo {
    CategoryInfo { category, code, bucket, provisional }
}

impl Category {
    /// Every category, in table order
    pub const ALL: [Category; 18] = [
        Category::Human,
        Category::Machine,
        Category::Mammalian,
        Category::Reptilian,
        Category::Avian,
        Category::Arthropoid,
        Category::Molluscoid,
        Category::Fungoid,
        Category::Plantoid,
        Category::Lithoid,
        Category::Necroid,
        Category::Aquatic,
        Category::Toxoid,
        Category::Cybernetic,
        Category::Synthetic,
        Category::Biogenesis,
        Category::Psionic,
        Category::Infernal,
    ];

    fn info(self) -> &'static CategoryInfo {
        // Table rows follow enum declaration order
        &CATEGORY_TABLE[self as usize]
    }

    /// Look up a category by its schema code (e.g. `HUMAN`)
    pub fn from_code(code: &str) -> Option<Self> {
        CATEGORY_TABLE
            .iter()
            .find(|info| info.code == code)
            .map(|info| info.category)
    }

    /// Schema code written as `species_class`
    pub fn code(self) -> &'static str {
        self.info().code
    }

    /// Portrait set name used as the manifest field
    pub fn bucket_name(self) -> &'static str {
        self.info().bucket
    }

    /// Whether the bucket name is a best guess
    pub fn is_provisional(self) -> bool {
        self.info().provisional
    }

    /// Name shown to users; humans are listed as HUMANOID
    pub fn label(self) -> &'static str {
        match self {
            Category::Human => "HUMANOID",
            other => other.code(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Binary image data stored as base64 text
///
/// Accepts either bare base64 or a data URL (`data:<mime>;base64,<data>`),
/// which is what browser upload paths hand over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    encoded: String,
}

impl Payload {
    /// Wrap already encoded text without checking it
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    /// Encode raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            encoded: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }

    /// The stored text, exactly as supplied
    pub fn as_encoded(&self) -> &str {
        &self.encoded
    }

    /// The base64 part of the stored text (after the data URL header, if any)
    fn base64_part(&self) -> &str {
        match self.encoded.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map_or("", |(_, data)| data),
            None => &self.encoded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.base64_part().trim().is_empty()
    }

    /// Decode back to the uploaded bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let cleaned: String = self
            .base64_part()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD.decode(cleaned)
    }
}

/// Whether `id` can be used as a path segment and an unquoted field name.
///
/// Ids must be non-empty and made of ASCII letters, digits and `_`.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// One exportable portrait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: String,
    /// Raw category code; checked against the table during classification
    pub category: String,
    pub payload: Option<Payload>,
}

impl Record {
    /// New record with the default category and no payload
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: Category::default().code().to_string(),
            payload: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Fails with `InvalidId` unless the id passes [`is_valid_id`]
    pub fn check_id(&self) -> ExportResult<()> {
        if is_valid_id(&self.id) {
            Ok(())
        } else {
            Err(ExportError::InvalidId { id: self.id.clone() })
        }
    }

    /// Parsed category, if the code is known
    pub fn category(&self) -> Option<Category> {
        Category::from_code(&self.category)
    }

    pub fn has_payload(&self) -> bool {
        self.payload.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// Decoded payload bytes
    pub fn payload_bytes(&self) -> ExportResult<Vec<u8>> {
        let payload = self
            .payload
            .as_ref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ExportError::MissingPayload(vec![RecordIssue::missing_payload(&self.id)])
            })?;
        payload.decode().map_err(|e| ExportError::InvalidPayload {
            record_id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_table_order_matches_enum() {
        for (index, category) in Category::ALL.iter().enumerate() {
            assert_eq!(CATEGORY_TABLE[index].category, *category);
            assert_eq!(Category::from_code(category.code()), Some(*category));
        }
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!(Category::Human.bucket_name(), "humans");
        assert_eq!(Category::Mammalian.bucket_name(), "mammalians");
        assert_eq!(Category::Biogenesis.bucket_name(), "biogenesis");
        assert_eq!(Category::Infernal.bucket_name(), "infernals");
    }

    #[test]
    fn test_provisional_buckets_preserved() {
        let provisional: Vec<_> = Category::ALL
            .iter()
            .filter(|c| c.is_provisional())
            .map(|c| c.bucket_name())
            .collect();
        assert_eq!(provisional, vec!["cybernetics", "synthetics", "biogenesis", "psionics"]);
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(Category::from_code("GIANT"), None);
        assert_eq!(Category::from_code("human"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Category::Human.label(), "HUMANOID");
        assert_eq!(Category::Avian.label(), "AVIAN");
    }

    #[test]
    fn test_payload_data_url() {
        let payload = Payload::from_encoded("data:image/vnd-ms.dds;base64,/9j/");
        assert_eq!(payload.decode().unwrap(), vec![0xFF, 0xD8, 0xFF]);
        assert!(!payload.is_empty());
    }

    #[test]
    fn test_payload_bytes_reversible() {
        let data = vec![0x44, 0x44, 0x53, 0x20, 0x00, 0xFF];
        assert_eq!(Payload::from_bytes(&data).decode().unwrap(), data);
    }

    #[test]
    fn test_empty_payload() {
        assert!(Payload::from_encoded("").is_empty());
        assert!(Payload::from_encoded("data:application/octet-stream;base64,").is_empty());

        let record = Record::new("abc").with_payload(Payload::from_encoded(""));
        assert!(!record.has_payload());
        assert!(matches!(record.payload_bytes(), Err(ExportError::MissingPayload(_))));
    }

    #[test]
    fn test_invalid_payload() {
        let record = Record::new("abc").with_payload(Payload::from_encoded("not base64!"));
        match record.payload_bytes() {
            Err(ExportError::InvalidPayload { record_id, .. }) => assert_eq!(record_id, "abc"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("aaaaaaaaaa"));
        assert!(is_valid_id("Portrait_01"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("a b"));
        assert!(!is_valid_id("a.txt/x"));
        assert!(!is_valid_id("a=b"));
        assert!(!is_valid_id("\"quoted\""));
        assert!(!is_valid_id("caf\u{e9}"));

        assert!(Record::new("abc").check_id().is_ok());
        match Record::new("a/b").check_id() {
            Err(ExportError::InvalidId { id }) => assert_eq!(id, "a/b"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_new_record_defaults() {
        let record = Record::new("abc");
        assert_eq!(record.id(), "abc");
        assert_eq!(record.category(), Some(Category::Mammalian));
        assert!(record.payload.is_none());
    }
}
