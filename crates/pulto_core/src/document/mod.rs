//! Workspace document codec.
//!
//! # Responsibility
//! - Convert window records to and from the notebook-shaped document.
//! - Render payloads into cell source text per export template.
//! - Persist documents atomically.
//!
//! # Invariants
//! - The codec never touches geometry parsers; models arrive already decoded.
//! - Fatal errors yield no windows; per-cell errors never block other cells.

pub mod codec;
pub mod error;
pub mod format;
pub mod ids;
pub mod source;
pub mod storage;

pub use codec::{
    decode_document, deserialize, read_export_summary, serialize, serialize_document,
    DecodedDocument, PendingDocument,
};
pub use error::{DocumentError, DocumentResult, PerCellError};
pub use ids::{IdAllocator, IdMapping, SequentialIds};
pub use source::{render_content, render_source};
