//! Filesystem watching for the save file. Events are bridged onto a
//! channel so the pipeline itself stays on one thread.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver};

use notify::event::{AccessKind, AccessMode};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::{BuddyError, Result};

/// Watches one file and collapses bursts of change events into single
/// wake-ups; the pipeline re-reads the whole file anyway, so only the
/// latest state matters.
pub struct SaveWatcher {
    rx: Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
}

impl SaveWatcher {
    pub fn new(path: &Path) -> Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = recommended_watcher(move |event| {
            let _ = tx.send(event);
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(Self {
            rx,
            _watcher: watcher,
        })
    }

    /// Block until the watched file changes, then drain whatever backlog
    /// queued up while the pipeline was busy.
    pub fn wait_for_change(&self) -> Result<()> {
        loop {
            let event = self
                .rx
                .recv()
                .map_err(|_| BuddyError::Config("file watcher channel closed".to_string()))?;
            let mut relevant = is_relevant(event);
            while let Ok(event) = self.rx.try_recv() {
                relevant = is_relevant(event) || relevant;
            }
            if relevant {
                return Ok(());
            }
        }
    }
}

/// The game rewrites the save in place; modify/create plus close-write
/// (the platforms that report it) cover that.
fn is_relevant(event: notify::Result<Event>) -> bool {
    let event = match event {
        Ok(event) => event,
        Err(err) => {
            log::warn!("file watch error: {err}");
            return false;
        }
    };
    matches!(
        event.kind,
        EventKind::Modify(_)
            | EventKind::Create(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}
