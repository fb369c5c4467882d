//! Validate, classify and lay out a record snapshot in one call

use tracing::{info, warn};

use crate::classify::classify;
use crate::error::{ExportError, ExportResult, RecordIssue};
use crate::layout::{ArchiveEntry, LayoutBuilder};
use crate::record::Record;
use crate::validate::validate;

/// Receives problems found before export so they can be shown to the user
pub trait ExportObserver {
    fn on_validation_error(&mut self, issues: &[RecordIssue]);
}

/// Observer that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ExportObserver for LogObserver {
    fn on_validation_error(&mut self, issues: &[RecordIssue]) {
        for issue in issues {
            warn!(id = %issue.record_id, "{}", issue.message());
        }
    }
}

/// Runs the full export pipeline
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    layout: LayoutBuilder,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: LayoutBuilder) -> Self {
        Self { layout }
    }

    /// Turn records into bundle entries.
    ///
    /// Missing images and unknown categories are reported to `observer` in
    /// full before the export is refused; no entries are produced in that case.
    pub fn export(
        &self,
        records: &[Record],
        observer: &mut dyn ExportObserver,
    ) -> ExportResult<Vec<ArchiveEntry>> {
        let report = validate(records);
        if !report.is_ok() {
            observer.on_validation_error(&report.issues);
            return Err(ExportError::MissingPayload(report.issues));
        }

        let classification = match classify(records) {
            Ok(c) => c,
            Err(ExportError::UnknownCategory(issues)) => {
                observer.on_validation_error(&issues);
                return Err(ExportError::UnknownCategory(issues));
            }
            Err(e) => return Err(e),
        };

        let entries = self.layout.build(&classification, records)?;
        info!(
            portraits = records.len(),
            sets = classification.len(),
            entries = entries.len(),
            "bundle laid out"
        );
        Ok(entries)
    }
}

/// Export with default settings
pub fn export(
    records: &[Record],
    observer: &mut dyn ExportObserver,
) -> ExportResult<Vec<ArchiveEntry>> {
    Exporter::new().export(records, observer)
}
