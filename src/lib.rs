//! # portrait-bundle
//!
//! Builds Stellaris static portrait mods from a list of portrait records.
//!
//! A portrait record is an id, a species category code and the uploaded
//! `.dds` image. Exporting a list of records produces every file the game
//! needs to load them:
//!
//! ```text
//! common/portrait_sets/0_portrait_sets.txt     one portrait set per category
//! gfx/models/portraits/<id>/<id>.dds           the image
//! gfx/portraits/portraits/<id>.txt             texture + portrait groups
//! ```
//!
//! ## Pipeline
//!
//! 1. [`validate`](validate::validate) checks every record has image data and
//!    reports all records that don't.
//! 2. [`classify`](classify::classify) groups records into portrait sets by
//!    category, keeping input order.
//! 3. [`LayoutBuilder`] produces the [`ArchiveEntry`] list, encoding text files
//!    with the structured text [`Writer`].
//!
//! [`Exporter`] runs all three; [`Bundle`] writes the result to a directory or
//! a single txtar file.
//!
//! ```rust
//! use portrait_bundle::{export, LogObserver, Payload, Record};
//!
//! let records = vec![Record::new("aaaaaaaaaa")
//!     .with_category("HUMAN")
//!     .with_payload(Payload::from_bytes(b"DDS "))];
//!
//! let entries = export(&records, &mut LogObserver)?;
//! assert_eq!(entries.len(), 3);
//! assert_eq!(entries[0].path, "common/portrait_sets/0_portrait_sets.txt");
//! # Ok::<(), portrait_bundle::ExportError>(())
//! ```
//!
//! ## Category names
//!
//! Category codes map to portrait set names through a fixed table. Some set
//! names (`cybernetics`, `synthetics`, `biogenesis`, `psionics`) are
//! unconfirmed and kept exactly as the game mod format currently expects them;
//! see [`Category::is_provisional`].

pub mod bundle;
pub mod classify;
pub mod error;
pub mod export;
pub mod layout;
pub mod record;
pub mod session;
pub mod structured;
pub mod validate;

pub use bundle::Bundle;
pub use classify::{classify, CategoryBucket, Classification};
pub use error::{ExportError, ExportResult, IssueKind, RecordIssue};
pub use export::{export, ExportObserver, Exporter, LogObserver};
pub use layout::{build_layout, ArchiveEntry, EntryContent, LayoutBuilder};
pub use record::{Category, Payload, Record};
pub use session::{
    AlphaIdGenerator, FilePayloadSource, IdGenerator, PayloadSource, PortraitSet,
    SequentialIdGenerator,
};
pub use structured::{Layout, Mapping, Scalar, Value, Writer, WriterConfig};
pub use validate::{validate, ValidationReport};
