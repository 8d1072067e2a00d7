//! Use-case services composed over the shared workspace.
//!
//! # Invariants
//! - Services never bypass `SharedWorkspace`; every mutation is serialized.
//! - Long-running work (decoding, file IO) happens outside the store lock
//!   except for the final commit.

pub mod autosave;
pub mod file_access;
pub mod import_service;

pub use autosave::{AutoSaver, SaveDebouncer, SaveReason, SaveSink, WorkspaceFileSink};
pub use file_access::{
    with_scoped_access, AccessProvider, FileAccessError, ScopedAccess, UnrestrictedAccess,
};
pub use import_service::{
    FileImportOutcome, ImportError, ImportResult, ImportService, LoadMode, LoadSummary,
    TabularParser,
};
