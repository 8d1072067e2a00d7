//! Workspace store, its shared handle and change events.
//!
//! # Invariants
//! - All mutations of one workspace go through one lock.
//! - Window ids are unique per store and never reused.

pub mod events;
pub mod shared;
pub mod workspace_store;

pub use events::{EventBus, WorkspaceEvent};
pub use shared::SharedWorkspace;
pub use workspace_store::{RestoreSummary, StoreError, StoreResult, WorkspaceStore};
