use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info};

use crate::io::project_io::MARKER_DIR;
use crate::io::reconciler::{
    self, ChangeKind, FsEvent, ProjectEvent, ReconcileInput, Reconciler, ReconcilerHandle,
};
use crate::model::project::ProjectGraph;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("no project to watch")]
    NoProject,
    #[error("could not watch {path}: {source}")]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Map a notify event kind to a change kind. Access and metadata-only
/// events are dropped.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Added),
        EventKind::Remove(_) => Some(ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Forward a raw notify callback result into the reconciler
fn forward(result: Result<Event, notify::Error>, tx: &Sender<ReconcileInput>) {
    match result {
        Ok(event) => {
            let Some(kind) = change_kind(&event.kind) else {
                return;
            };
            for path in event.paths {
                let _ = tx.send(ReconcileInput::Fs(FsEvent { path, kind }));
            }
        }
        Err(e) => {
            let _ = tx.send(ReconcileInput::WatchFailed(e.to_string()));
        }
    }
}

/// Live view of a project: watches the `.ai/` directory and publishes
/// debounced rebuilds.
///
/// Dropping the watcher stops the filesystem feed first, then the
/// reconciler thread, so no event arrives after shutdown.
pub struct ProjectWatcher {
    watcher: Option<RecommendedWatcher>,
    handle: Option<ReconcilerHandle>,
    rx: Receiver<ProjectEvent>,
    started: Option<ProjectEvent>,
}

impl ProjectWatcher {
    /// Start watching the project behind `graph`.
    /// Call `poll()` each tick to collect events.
    pub fn start(graph: Arc<ProjectGraph>, debounce: Duration) -> Result<Self, WatchError> {
        if !graph.is_valid() {
            return Err(WatchError::NoProject);
        }
        let marker = graph.root().join(MARKER_DIR);
        let (handle, rx) = reconciler::spawn(Reconciler::new(graph, debounce));
        let tx = handle.input();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| forward(result, &tx),
            Config::default(),
        )
        .map_err(|source| WatchError::Notify {
            path: marker.clone(),
            source,
        })?;
        watcher
            .watch(&marker, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Notify {
                path: marker.clone(),
                source,
            })?;
        info!(path = %marker.display(), "watching started");

        Ok(ProjectWatcher {
            watcher: Some(watcher),
            handle: Some(handle),
            rx,
            started: Some(ProjectEvent::WatchingStarted),
        })
    }

    /// Non-blocking poll for pending events.
    /// Returns all queued events (may be empty).
    pub fn poll(&mut self) -> Vec<ProjectEvent> {
        let mut events: Vec<ProjectEvent> = self.started.take().into_iter().collect();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Blocking wait for the next event
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<ProjectEvent> {
        if let Some(started) = self.started.take() {
            return Some(started);
        }
        self.rx.recv_timeout(timeout).ok()
    }

    /// Rebuild immediately, skipping the debounce window
    pub fn reload_now(&self) {
        if let Some(handle) = &self.handle {
            handle.reload_now();
        }
    }

    /// Stop watching. Pending reloads are cancelled.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.watcher.take().is_some() {
            debug!("watching stopped");
        }
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

impl Drop for ProjectWatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
