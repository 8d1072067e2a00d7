//! Event-driven auto-persistence.
//!
//! # Responsibility
//! - Decide when a workspace change must be saved ([`SaveDebouncer`]).
//! - Run saves on a background thread ([`AutoSaver`]).
//!
//! # Invariants
//! - Content changes, structural changes and focus loss save immediately.
//! - Movement saves fire once a window has been still for the interval;
//!   another move of the same window restarts its timer.
//! - A manual save fires immediately and cancels every pending timer.

use crate::model::window::WindowId;
use crate::service::import_service::{ImportResult, ImportService};
use crate::store::events::WorkspaceEvent;
use crossbeam_channel::{at, bounded, never, select, Receiver, Sender};
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Why a save is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReason {
    Changed,
    FocusLost,
    Manual,
    MovementSettled,
    Shutdown,
}

impl SaveReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::FocusLost => "focus_lost",
            Self::Manual => "manual",
            Self::MovementSettled => "movement_settled",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Pure save scheduler; time is always passed in.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    interval: Duration,
    deadlines: HashMap<WindowId, Instant>,
}

impl SaveDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadlines: HashMap::new(),
        }
    }

    /// Feeds one event; returns the reason when a save must run now.
    pub fn on_event(&mut self, event: &WorkspaceEvent, now: Instant) -> Option<SaveReason> {
        match event {
            WorkspaceEvent::Moved(id) => {
                self.deadlines.insert(*id, now + self.interval);
                None
            }
            WorkspaceEvent::ManualSaveRequested => {
                self.deadlines.clear();
                Some(SaveReason::Manual)
            }
            WorkspaceEvent::FocusLost => Some(SaveReason::FocusLost),
            WorkspaceEvent::Removed(id) => {
                self.deadlines.remove(id);
                Some(SaveReason::Changed)
            }
            WorkspaceEvent::Cleared => {
                self.deadlines.clear();
                Some(SaveReason::Changed)
            }
            WorkspaceEvent::Created(_)
            | WorkspaceEvent::Updated(_)
            | WorkspaceEvent::Restored { .. } => Some(SaveReason::Changed),
        }
    }

    /// Expires settled timers; one save covers all of them.
    pub fn poll(&mut self, now: Instant) -> Option<SaveReason> {
        let before = self.deadlines.len();
        self.deadlines.retain(|_, deadline| *deadline > now);
        (self.deadlines.len() < before).then_some(SaveReason::MovementSettled)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }
}

/// Destination of auto-saves.
pub trait SaveSink: Send + 'static {
    fn save(&mut self, reason: SaveReason) -> ImportResult<()>;
}

/// Saves the service's workspace to a fixed document path.
pub struct WorkspaceFileSink {
    service: ImportService,
    path: PathBuf,
}

impl WorkspaceFileSink {
    pub fn new(service: ImportService, path: PathBuf) -> Self {
        Self { service, path }
    }
}

impl SaveSink for WorkspaceFileSink {
    fn save(&mut self, _reason: SaveReason) -> ImportResult<()> {
        self.service.save_workspace(&self.path).map(|_| ())
    }
}

/// Background thread that turns workspace events into saves.
///
/// Dropping the saver stops the thread after one final save of any
/// movement still waiting on its timer.
pub struct AutoSaver {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl AutoSaver {
    pub fn spawn(
        events: Receiver<WorkspaceEvent>,
        interval: Duration,
        sink: impl SaveSink,
    ) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let worker = std::thread::spawn(move || run(events, stop_rx, interval, sink));
        Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        }
    }

    /// Stops the thread and waits for it.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        // Dropping the sender disconnects the stop channel.
        self.stop.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("event=autosave module=service status=error reason=worker_panicked");
            }
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run(
    events: Receiver<WorkspaceEvent>,
    stop: Receiver<()>,
    interval: Duration,
    mut sink: impl SaveSink,
) {
    let mut debouncer = SaveDebouncer::new(interval);
    info!(
        "event=autosave module=service status=start debounce_ms={}",
        interval.as_millis()
    );
    loop {
        let timer = match debouncer.next_deadline() {
            Some(deadline) => at(deadline),
            None => never(),
        };
        select! {
            recv(events) -> event => match event {
                Ok(event) => {
                    if let Some(reason) = debouncer.on_event(&event, Instant::now()) {
                        save(&mut sink, reason);
                    }
                }
                Err(_) => break,
            },
            recv(stop) -> _ => break,
            recv(timer) -> _ => {}
        }
        if let Some(reason) = debouncer.poll(Instant::now()) {
            save(&mut sink, reason);
        }
    }
    if debouncer.pending() > 0 {
        save(&mut sink, SaveReason::Shutdown);
    }
    info!("event=autosave module=service status=stop");
}

fn save(sink: &mut impl SaveSink, reason: SaveReason) {
    let started_at = Instant::now();
    match sink.save(reason) {
        Ok(()) => info!(
            "event=autosave module=service status=ok reason={} duration_ms={}",
            reason.as_str(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=autosave module=service status=error reason={} error={}",
            reason.as_str(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{SaveDebouncer, SaveReason};
    use crate::store::events::WorkspaceEvent;
    use std::time::{Duration, Instant};

    #[test]
    fn repeated_moves_restart_the_timer() {
        let start = Instant::now();
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(100));
        assert_eq!(debouncer.on_event(&WorkspaceEvent::Moved(1), start), None);
        let later = start + Duration::from_millis(80);
        assert_eq!(debouncer.on_event(&WorkspaceEvent::Moved(1), later), None);

        assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(181)),
            Some(SaveReason::MovementSettled)
        );
        assert_eq!(debouncer.pending(), 0);
    }

    #[test]
    fn manual_save_cancels_pending_timers() {
        let now = Instant::now();
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(100));
        debouncer.on_event(&WorkspaceEvent::Moved(1), now);
        debouncer.on_event(&WorkspaceEvent::Moved(2), now);
        assert_eq!(
            debouncer.on_event(&WorkspaceEvent::ManualSaveRequested, now),
            Some(SaveReason::Manual)
        );
        assert_eq!(debouncer.next_deadline(), None);
        assert_eq!(debouncer.poll(now + Duration::from_secs(1)), None);
    }

    #[test]
    fn content_changes_save_immediately() {
        let mut debouncer = SaveDebouncer::new(Duration::from_millis(100));
        assert_eq!(
            debouncer.on_event(&WorkspaceEvent::Updated(3), Instant::now()),
            Some(SaveReason::Changed)
        );
        assert_eq!(
            debouncer.on_event(&WorkspaceEvent::FocusLost, Instant::now()),
            Some(SaveReason::FocusLost)
        );
    }
}
