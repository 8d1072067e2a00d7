//! Single-writer handle shared between the UI, importers and auto-save.
//!
//! # Invariants
//! - Every mutation runs under one mutex, so the id counter cannot race.
//! - Events are published after the lock is released, and only for
//!   mutations that succeeded.

use crate::config::WorkspaceConfig;
use crate::model::payload::WindowPayload;
use crate::model::window::{
    ExportTemplate, LegendPosition, Placement, WindowId, WindowKind, WindowRecord, WindowState,
};
use crate::store::events::{EventBus, WorkspaceEvent};
use crate::store::workspace_store::{RestoreSummary, StoreResult, WorkspaceStore};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Cloneable handle to one workspace store plus its event bus.
#[derive(Debug, Clone)]
pub struct SharedWorkspace {
    store: Arc<Mutex<WorkspaceStore>>,
    events: Arc<EventBus>,
}

impl Default for SharedWorkspace {
    fn default() -> Self {
        Self::new(WorkspaceStore::default())
    }
}

impl SharedWorkspace {
    pub fn new(store: WorkspaceStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(WorkspaceStore::new(config))
    }

    pub fn subscribe(&self) -> Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, event: WorkspaceEvent) {
        self.events.publish(event);
    }

    pub fn notify_focus_lost(&self) {
        self.publish(WorkspaceEvent::FocusLost);
    }

    pub fn request_save(&self) {
        self.publish(WorkspaceEvent::ManualSaveRequested);
    }

    /// Runs `f` with shared access to the store.
    pub fn read<R>(&self, f: impl FnOnce(&WorkspaceStore) -> R) -> R {
        let guard = self.store.lock();
        f(&*guard)
    }

    /// Runs `f` with exclusive access. Publishes nothing; callers emit the
    /// matching event themselves.
    pub fn write<R>(&self, f: impl FnOnce(&mut WorkspaceStore) -> R) -> R {
        let mut guard = self.store.lock();
        f(&mut *guard)
    }

    pub fn create(&self, kind: WindowKind, placement: Option<Placement>) -> WindowRecord {
        let record = self.write(|store| store.create(kind, placement));
        self.publish(WorkspaceEvent::Created(record.id));
        record
    }

    pub fn update(&self, id: WindowId, payload: WindowPayload) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| store.update(id, payload))
    }

    pub fn update_content(&self, id: WindowId, content: impl Into<String>) -> StoreResult<()> {
        let content = content.into();
        self.mutate(WorkspaceEvent::Updated(id), |store| {
            store.update_content(id, content)
        })
    }

    pub fn update_placement(&self, id: WindowId, placement: Placement) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Moved(id), |store| {
            store.update_placement(id, placement)
        })
    }

    pub fn set_tags(&self, id: WindowId, tags: Vec<String>) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| store.set_tags(id, tags))
    }

    pub fn set_template(&self, id: WindowId, template: ExportTemplate) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| {
            store.set_template(id, template)
        })
    }

    pub fn set_state(&self, id: WindowId, state: WindowState) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| store.set_state(id, state))
    }

    pub fn close(&self, id: WindowId) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| store.close(id))
    }

    pub fn reopen(&self, id: WindowId) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| store.reopen(id))
    }

    pub fn set_legend_position(&self, id: WindowId, position: LegendPosition) -> StoreResult<()> {
        self.mutate(WorkspaceEvent::Updated(id), |store| {
            store.set_legend_position(id, position)
        })
    }

    pub fn remove(&self, id: WindowId) -> StoreResult<WindowRecord> {
        let removed = self.write(|store| store.remove(id))?;
        self.publish(WorkspaceEvent::Removed(id));
        Ok(removed)
    }

    pub fn clear_all(&self) -> usize {
        let removed = self.write(WorkspaceStore::clear_all);
        self.publish(WorkspaceEvent::Cleared);
        removed
    }

    pub fn restore(&self, records: Vec<WindowRecord>) -> RestoreSummary {
        let summary = self.write(|store| store.restore(records));
        self.publish(WorkspaceEvent::Restored {
            count: summary.restored.len(),
        });
        summary
    }

    pub fn get(&self, id: WindowId) -> Option<WindowRecord> {
        self.read(|store| store.get(id).cloned())
    }

    pub fn all(&self, open_only: bool) -> Vec<WindowRecord> {
        self.read(|store| store.all(open_only))
    }

    pub fn len(&self) -> usize {
        self.read(WorkspaceStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(WorkspaceStore::is_empty)
    }

    /// Consistent copy of every window and legend position, in id order.
    pub fn snapshot(&self) -> (Vec<WindowRecord>, BTreeMap<WindowId, LegendPosition>) {
        self.read(|store| (store.all(false), store.legend_positions().clone()))
    }

    fn mutate(
        &self,
        event: WorkspaceEvent,
        f: impl FnOnce(&mut WorkspaceStore) -> StoreResult<()>,
    ) -> StoreResult<()> {
        self.write(f)?;
        self.publish(event);
        Ok(())
    }
}
