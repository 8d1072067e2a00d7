//! Geometry decode error taxonomy.

use thiserror::Error;

/// Result type for geometry decoding and routing.
pub type GeometryResult<T> = Result<T, GeometryImportError>;

/// Typed decode failures returned by parsers and the import router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryImportError {
    /// Extension (or JSON shape) has no decoder and no placeholder policy.
    #[error("unsupported geometry format: `{0}`")]
    UnsupportedFormat(String),
    /// Bytes are shorter than their declared layout or structurally broken.
    #[error("corrupted geometry file: {0}")]
    CorruptedFile(String),
    /// A text-based format was handed bytes that are not UTF-8.
    #[error("geometry text is not valid UTF-8: {0}")]
    InvalidEncoding(String),
}
