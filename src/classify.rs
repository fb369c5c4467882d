//! Grouping of records into portrait sets

use std::collections::HashMap;

use crate::error::{ExportError, ExportResult, RecordIssue};
use crate::record::{Category, Record};

/// Records sharing one category, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBucket {
    pub category: Category,
    pub member_ids: Vec<String>,
}

impl CategoryBucket {
    pub fn bucket_name(&self) -> &'static str {
        self.category.bucket_name()
    }
}

/// Buckets keyed by portrait set name, ordered by first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    buckets: Vec<CategoryBucket>,
    /// Bucket name -> position in `buckets`
    index: HashMap<&'static str, usize>,
}

impl Classification {
    pub fn get(&self, bucket_name: &str) -> Option<&CategoryBucket> {
        self.index.get(bucket_name).and_then(|&i| self.buckets.get(i))
    }

    pub fn buckets(&self) -> &[CategoryBucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn push(&mut self, category: Category, id: &str) {
        let name = category.bucket_name();
        let slot = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.buckets.push(CategoryBucket {
                    category,
                    member_ids: Vec::new(),
                });
                self.index.insert(name, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        self.buckets[slot].member_ids.push(id.to_string());
    }
}

/// Group records by their category's portrait set.
///
/// Every record with a code outside the category table is reported in one
/// `UnknownCategory` error; no record is dropped or guessed.
pub fn classify(records: &[Record]) -> ExportResult<Classification> {
    let mut classification = Classification::default();
    let mut unknown = Vec::new();

    for record in records {
        match record.category() {
            Some(category) => classification.push(category, record.id()),
            None => {
                unknown.push(RecordIssue::unknown_category(record.id(), record.category.clone()))
            }
        }
    }

    if !unknown.is_empty() {
        return Err(ExportError::UnknownCategory(unknown));
    }
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;

    #[test]
    fn test_classify_preserves_order() {
        let records = vec![
            Record::new("b1").with_category("AVIAN"),
            Record::new("m1").with_category("MAMMALIAN"),
            Record::new("b2").with_category("AVIAN"),
            Record::new("m2").with_category("MAMMALIAN"),
            Record::new("b0").with_category("AVIAN"),
        ];
        let classification = classify(&records).unwrap();

        assert_eq!(classification.len(), 2);
        let names: Vec<_> = classification.buckets().iter().map(|b| b.bucket_name()).collect();
        assert_eq!(names, vec!["avians", "mammalians"]);

        let avians = classification.get("avians").unwrap();
        assert_eq!(avians.category, Category::Avian);
        assert_eq!(avians.member_ids, vec!["b1", "b2", "b0"]);
        assert_eq!(classification.get("mammalians").unwrap().member_ids, vec!["m1", "m2"]);
    }

    #[test]
    fn test_classify_no_empty_buckets() {
        let classification = classify(&[Record::new("a").with_category("HUMAN")]).unwrap();
        assert_eq!(classification.len(), 1);
        assert!(classification.get("machines").is_none());

        assert!(classify(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_classify_unknown_category() {
        let records = vec![
            Record::new("ok").with_category("HUMAN"),
            Record::new("bad1").with_category("GIANT"),
            Record::new("bad2").with_category(""),
        ];
        match classify(&records) {
            Err(ExportError::UnknownCategory(issues)) => {
                assert_eq!(issues.len(), 2);
                assert_eq!(issues[0].record_id, "bad1");
                assert_eq!(issues[0].kind, IssueKind::UnknownCategory { code: "GIANT".into() });
                assert_eq!(issues[1].record_id, "bad2");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
