//! Workspace change notifications.

use crate::model::window::WindowId;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

/// Something that happened to the workspace or its host window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    Created(WindowId),
    /// Payload, content, tags, template, state or visibility changed.
    Updated(WindowId),
    Moved(WindowId),
    Removed(WindowId),
    Cleared,
    Restored { count: usize },
    /// The host application lost focus.
    FocusLost,
    ManualSaveRequested,
}

/// Fan-out of events to any number of channel subscribers.
///
/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<WorkspaceEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<WorkspaceEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    pub fn publish(&self, event: WorkspaceEvent) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, WorkspaceEvent};

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(WorkspaceEvent::Created(1));
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(WorkspaceEvent::Created(1)));
    }
}
