//! Authoritative window collection for one open workspace.
//!
//! # Responsibility
//! - Own window records and identifier allocation.
//! - Apply typed mutations and reject kind-mismatched payloads.
//!
//! # Invariants
//! - Ids come from a monotonically increasing counter and are never reused,
//!   not even after `remove` or `clear_all`.
//! - Records are kept in id order, which is also creation order.
//! - Every mutating operation bumps the record's `modified_at`.
//! - Legend positions only exist for windows present in the store.

use crate::config::WorkspaceConfig;
use crate::document::ids::IdAllocator;
use crate::model::payload::WindowPayload;
use crate::model::window::{
    ExportTemplate, LegendPosition, Placement, WindowId, WindowKind, WindowRecord, WindowState,
    WindowValidationError,
};
use log::{debug, info};
use std::collections::BTreeMap;
use thiserror::Error;

const CASCADE_STEP: f64 = 40.0;
const CASCADE_SLOTS: usize = 8;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("window not found: {0}")]
    WindowNotFound(WindowId),
    #[error("window {id} is a `{kind}` window; refusing `{payload}` payload")]
    KindMismatch {
        id: WindowId,
        kind: &'static str,
        payload: &'static str,
    },
    #[error("window {id} rejected: {source}")]
    InvalidRecord {
        id: WindowId,
        #[source]
        source: WindowValidationError,
    },
}

/// Outcome of a bulk restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Ids of restored windows, in input order.
    pub restored: Vec<WindowId>,
    /// Records whose id collided with an existing window and was replaced.
    pub reassigned: usize,
}

/// Window collection with its id counter and legend positions.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    windows: BTreeMap<WindowId, WindowRecord>,
    legend_positions: BTreeMap<WindowId, LegendPosition>,
    next_id: WindowId,
    min_width: f64,
    min_height: f64,
    default_width: f64,
    default_height: f64,
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new(&WorkspaceConfig::default())
    }
}

impl WorkspaceStore {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            windows: BTreeMap::new(),
            legend_positions: BTreeMap::new(),
            next_id: 1,
            min_width: config.min_window_width,
            min_height: config.min_window_height,
            default_width: config.default_window_width,
            default_height: config.default_window_height,
        }
    }

    /// Creates an empty window. Without a placement, new windows cascade
    /// from the origin so they do not stack exactly.
    pub fn create(&mut self, kind: WindowKind, placement: Option<Placement>) -> WindowRecord {
        let placement = placement.unwrap_or_else(|| {
            let offset = (self.windows.len() % CASCADE_SLOTS) as f64 * CASCADE_STEP;
            Placement::new(offset, -offset, 0.0, self.default_width, self.default_height)
        });
        let id = self.allocate_id();
        let record = WindowRecord::new(id, kind, placement);
        self.windows.insert(id, record.clone());
        debug!(
            "event=window_create module=store status=ok window_id={} kind={}",
            id,
            kind.as_str()
        );
        record
    }

    /// Replaces the payload of an existing window.
    ///
    /// A payload of another kind is rejected and leaves the window untouched.
    pub fn update(&mut self, id: WindowId, payload: WindowPayload) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        if payload.kind() != record.kind {
            debug!(
                "event=window_update module=store status=rejected window_id={} kind={} payload={}",
                id,
                record.kind.as_str(),
                payload.kind().as_str()
            );
            return Err(StoreError::KindMismatch {
                id,
                kind: record.kind.as_str(),
                payload: payload.kind().as_str(),
            });
        }
        record
            .set_payload(payload)
            .map_err(|source| StoreError::InvalidRecord { id, source })
    }

    pub fn update_content(&mut self, id: WindowId, content: impl Into<String>) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        record.content = content.into();
        record.touch();
        Ok(())
    }

    pub fn update_placement(&mut self, id: WindowId, placement: Placement) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        record.placement = placement;
        record.touch();
        Ok(())
    }

    pub fn set_tags(&mut self, id: WindowId, tags: Vec<String>) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        record.tags = tags;
        record.touch();
        Ok(())
    }

    pub fn set_template(&mut self, id: WindowId, template: ExportTemplate) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        record.export_template = template;
        record.touch();
        Ok(())
    }

    /// Replaces presentation state after validating it.
    pub fn set_state(&mut self, id: WindowId, state: WindowState) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        let previous = record.state;
        record.state = state;
        if let Err(source) = record.validate() {
            record.state = previous;
            return Err(StoreError::InvalidRecord { id, source });
        }
        record.touch();
        Ok(())
    }

    /// Hides a window from open queries without removing it.
    pub fn close(&mut self, id: WindowId) -> StoreResult<()> {
        self.set_open(id, false)
    }

    pub fn reopen(&mut self, id: WindowId) -> StoreResult<()> {
        self.set_open(id, true)
    }

    fn set_open(&mut self, id: WindowId, open: bool) -> StoreResult<()> {
        let record = self.record_mut(id)?;
        record.is_open = open;
        record.touch();
        Ok(())
    }

    /// Removes a window and its legend position.
    pub fn remove(&mut self, id: WindowId) -> StoreResult<WindowRecord> {
        let record = self
            .windows
            .remove(&id)
            .ok_or(StoreError::WindowNotFound(id))?;
        self.legend_positions.remove(&id);
        Ok(record)
    }

    /// Removes every window. The id counter keeps counting.
    pub fn clear_all(&mut self) -> usize {
        let removed = self.windows.len();
        self.windows.clear();
        self.legend_positions.clear();
        info!("event=workspace_clear module=store status=ok removed={removed}");
        removed
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.get(&id)
    }

    /// Windows in id order; `open_only` drops closed windows.
    pub fn all(&self, open_only: bool) -> Vec<WindowRecord> {
        self.windows
            .values()
            .filter(|record| !open_only || record.is_open)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Inserts decoded records in bulk.
    ///
    /// Sizes are clamped to the configured minimum. A record whose id is
    /// zero or already taken gets a fresh one; the counter is moved past
    /// every kept id.
    pub fn restore(&mut self, records: Vec<WindowRecord>) -> RestoreSummary {
        let mut summary = RestoreSummary::default();
        for mut record in records {
            if record.id == 0 || self.windows.contains_key(&record.id) {
                record.id = self.allocate_id();
                summary.reassigned += 1;
            } else if record.id >= self.next_id {
                self.next_id = record.id.saturating_add(1);
            }
            record.placement = record.placement.clamped(self.min_width, self.min_height);
            summary.restored.push(record.id);
            self.windows.insert(record.id, record);
        }
        info!(
            "event=workspace_restore module=store status=ok restored={} reassigned={} total={}",
            summary.restored.len(),
            summary.reassigned,
            self.windows.len()
        );
        summary
    }

    pub fn legend_positions(&self) -> &BTreeMap<WindowId, LegendPosition> {
        &self.legend_positions
    }

    pub fn set_legend_position(
        &mut self,
        id: WindowId,
        position: LegendPosition,
    ) -> StoreResult<()> {
        if !self.windows.contains_key(&id) {
            return Err(StoreError::WindowNotFound(id));
        }
        self.legend_positions.insert(id, position);
        Ok(())
    }

    /// Merges already-remapped legend positions, dropping unknown ids.
    pub fn merge_legend_positions(&mut self, positions: BTreeMap<WindowId, LegendPosition>) {
        for (id, position) in positions {
            if self.windows.contains_key(&id) {
                self.legend_positions.insert(id, position);
            }
        }
    }

    fn record_mut(&mut self, id: WindowId) -> StoreResult<&mut WindowRecord> {
        self.windows
            .get_mut(&id)
            .ok_or(StoreError::WindowNotFound(id))
    }
}

impl IdAllocator for WorkspaceStore {
    fn allocate_id(&mut self) -> WindowId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}
