//! Document file IO.

use crate::document::error::DocumentResult;
use log::info;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `bytes` to `path` atomically.
///
/// The document is written to a temporary file in the destination directory
/// and then renamed over `path`, so readers never observe a partial write.
pub fn write_document_atomic(path: &Path, bytes: &[u8]) -> DocumentResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(directory)?;
    staging.write_all(bytes)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|err| err.error)?;
    info!(
        "event=document_write module=document status=ok path={} bytes={}",
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Reads a whole document into memory.
pub fn read_document(path: &Path) -> DocumentResult<Vec<u8>> {
    Ok(std::fs::read(path)?)
}
