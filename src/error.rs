//! Error types for bundle export

use std::fmt;
use std::io;

use thiserror::Error;

/// Kind of problem found on a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// No payload was attached, or the attached payload is empty
    MissingPayload,
    /// Category code is not in the category table
    UnknownCategory { code: String },
}

/// A problem attached to one record, reported to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// Id of the offending record
    pub record_id: String,
    pub kind: IssueKind,
}

impl RecordIssue {
    pub fn missing_payload(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            kind: IssueKind::MissingPayload,
        }
    }

    pub fn unknown_category(record_id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            kind: IssueKind::UnknownCategory { code: code.into() },
        }
    }

    /// Human readable message for this issue
    pub fn message(&self) -> String {
        match &self.kind {
            IssueKind::MissingPayload => {
                format!("Portrait ID {} is missing image data!", self.record_id)
            }
            IssueKind::UnknownCategory { code } => {
                format!("Portrait ID {} has unknown category '{}'", self.record_id, code)
            }
        }
    }
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

fn join_ids(issues: &[RecordIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.record_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while validating, classifying or laying out records
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{} portrait(s) missing image data: {}", .0.len(), join_ids(.0))]
    MissingPayload(Vec<RecordIssue>),

    #[error("{} portrait(s) with unknown category: {}", .0.len(), join_ids(.0))]
    UnknownCategory(Vec<RecordIssue>),

    #[error("duplicate portrait id '{id}'")]
    DuplicateId { id: String },

    #[error("invalid portrait id '{id}': use ASCII letters, digits and '_'")]
    InvalidId { id: String },

    #[error("unknown portrait id '{id}'")]
    UnknownRecord { id: String },

    #[error("value nesting exceeds {limit} levels (cyclic value?)")]
    CyclicValue { limit: usize },

    #[error("{value} cannot be written as a number")]
    NonFiniteNumber { value: f64 },

    #[error("invalid image data for portrait '{record_id}': {reason}")]
    InvalidPayload { record_id: String, reason: String },

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the crate
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_payload_message_lists_every_id() {
        let err = ExportError::MissingPayload(vec![
            RecordIssue::missing_payload("abc"),
            RecordIssue::missing_payload("xyz"),
        ]);
        assert_eq!(err.to_string(), "2 portrait(s) missing image data: abc, xyz");
    }

    #[test]
    fn test_issue_messages() {
        let issue = RecordIssue::missing_payload("abc");
        assert_eq!(issue.message(), "Portrait ID abc is missing image data!");

        let issue = RecordIssue::unknown_category("abc", "GIANT");
        assert_eq!(issue.to_string(), "Portrait ID abc has unknown category 'GIANT'");
    }
}
