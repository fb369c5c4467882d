//! Pre-flight checks run before any bundle entry is produced

use crate::error::RecordIssue;
use crate::record::Record;

/// Outcome of [`validate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Every problem found, in record order
    pub issues: Vec<RecordIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Ids of the records that failed
    pub fn record_ids(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.record_id.as_str()).collect()
    }
}

/// Check that every record carries image data.
///
/// All records are checked; the report holds one issue per record without a
/// payload. An empty list is valid.
pub fn validate(records: &[Record]) -> ValidationReport {
    let issues = records
        .iter()
        .filter(|record| !record.has_payload())
        .map(|record| RecordIssue::missing_payload(record.id()))
        .collect();
    ValidationReport { issues }
}
