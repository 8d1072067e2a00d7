//! Scoped access to externally referenced files.
//!
//! # Invariants
//! - Access acquired through [`ScopedAccess`] is released exactly once,
//!   when the guard drops, on every exit path.

use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileAccessError {
    #[error("access to `{path}` was denied: {reason}")]
    Denied { path: String, reason: String },
}

/// Platform hook that grants and revokes access to a path.
pub trait AccessProvider: Send + Sync {
    fn acquire(&self, path: &Path) -> Result<(), FileAccessError>;
    fn release(&self, path: &Path);
}

/// Provider for environments without sandboxed file access.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrestrictedAccess;

impl AccessProvider for UnrestrictedAccess {
    fn acquire(&self, _path: &Path) -> Result<(), FileAccessError> {
        Ok(())
    }

    fn release(&self, _path: &Path) {}
}

/// Lease on one path; dropping it releases access.
pub struct ScopedAccess<'a> {
    provider: &'a dyn AccessProvider,
    path: PathBuf,
}

impl<'a> ScopedAccess<'a> {
    pub fn acquire(provider: &'a dyn AccessProvider, path: &Path) -> Result<Self, FileAccessError> {
        provider.acquire(path)?;
        debug!(
            "event=file_access module=service status=acquired path={}",
            path.display()
        );
        Ok(Self {
            provider,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedAccess<'_> {
    fn drop(&mut self) {
        self.provider.release(&self.path);
        debug!(
            "event=file_access module=service status=released path={}",
            self.path.display()
        );
    }
}

/// Runs `f` while holding access to `path`.
pub fn with_scoped_access<T, E>(
    provider: &dyn AccessProvider,
    path: &Path,
    f: impl FnOnce(&Path) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<FileAccessError>,
{
    let lease = ScopedAccess::acquire(provider, path)?;
    f(lease.path())
}
