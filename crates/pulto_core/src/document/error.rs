//! Document codec errors.

use crate::model::window::WindowId;
use thiserror::Error;

/// Result type for document encode/decode.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Whole-operation failures. No window is restored when one of these is
/// returned.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("invalid notebook format: {0}")]
    InvalidNotebookFormat(String),
    #[error("document encoding failed: {0}")]
    Encode(String),
    #[error("document io failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Recoverable failure confined to one cell; the cell is not restored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cell {cell_index}: {reason}")]
pub struct PerCellError {
    /// Position of the cell in the document's `cells` list.
    pub cell_index: usize,
    /// Identifier recorded in the document, when readable.
    pub window_id: Option<WindowId>,
    pub reason: String,
}
