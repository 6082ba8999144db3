use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::io::project_io::{
    INDEX_FILE, MARKER_DIR, PLANS_DIR, TASKS_DIR, load_project, load_task_file, task_file_id,
};
use crate::model::project::ProjectGraph;
use crate::model::task::Task;

/// Default quiet period before a reload
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// A raw change notification from the filesystem feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        FsEvent {
            path: path.into(),
            kind,
        }
    }
}

/// Which part of the project a changed path belongs to. Every route ends in
/// a full rebuild; the route only decides whether the single-file fast path
/// runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeRoute {
    TaskFile,
    PlanFile,
    IndexFile,
    Other,
}

/// Route a path relative to the project root. Paths outside the marker
/// directory yield `None`.
///
/// Only files the loader would pick up count as task files: directly inside
/// `tasks/` and named `task<id>_<slug>.md`.
pub fn classify(root: &Path, path: &Path) -> Option<ChangeRoute> {
    let rel = path.strip_prefix(root.join(MARKER_DIR)).ok()?;
    let is_md = rel.extension().and_then(|e| e.to_str()) == Some("md");
    let is_task_file = rel.parent() == Some(Path::new(TASKS_DIR))
        && rel
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(task_file_id)
            .is_some();

    if rel == Path::new(INDEX_FILE) {
        Some(ChangeRoute::IndexFile)
    } else if is_task_file {
        Some(ChangeRoute::TaskFile)
    } else if is_md && rel.starts_with(PLANS_DIR) {
        Some(ChangeRoute::PlanFile)
    } else {
        Some(ChangeRoute::Other)
    }
}

/// Messages into the reconciler loop
#[derive(Debug)]
pub enum ReconcileInput {
    Fs(FsEvent),
    /// The filesystem feed itself failed. Later `Fs` inputs are ignored but
    /// `ReloadNow` is still served.
    WatchFailed(String),
    /// Rebuild immediately, dropping any pending debounce
    ReloadNow,
    Shutdown,
}

/// Notifications published to listeners
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    WatchingStarted,
    /// Advisory: a single task file was re-parsed. A full
    /// [`ProjectEvent::ProjectChanged`] always follows.
    TaskChanged { task: Box<Task>, kind: ChangeKind },
    /// A new snapshot replaces the previous one
    ProjectChanged(Arc<ProjectGraph>),
    /// A rebuild failed; the previous snapshot stays current
    ReloadFailed(String),
    WatchFailed(String),
    WatchingStopped,
}

/// `Reloading` is held only while [`Reconciler::reload`] runs. Rebuilds are
/// serialized by the loop thread, which handles one input at a time; events
/// that arrive during a rebuild queue on the channel behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    DebouncePending { deadline: Instant },
    Reloading,
}

/// Debounced rebuild state machine.
///
/// Owns the single writable snapshot slot. Time is passed in by the caller
/// so that the machine itself never sleeps.
#[derive(Debug)]
pub struct Reconciler {
    root: PathBuf,
    debounce: Duration,
    state: ReconcileState,
    snapshot: Arc<ProjectGraph>,
}

impl Reconciler {
    pub fn new(snapshot: Arc<ProjectGraph>, debounce: Duration) -> Self {
        Reconciler {
            root: snapshot.root().to_path_buf(),
            debounce,
            state: ReconcileState::Idle,
            snapshot,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// The latest good snapshot
    pub fn snapshot(&self) -> &Arc<ProjectGraph> {
        &self.snapshot
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            ReconcileState::DebouncePending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Record a filesystem event: (re)start the debounce timer and, for an
    /// added or modified task file, parse that file right away.
    pub fn on_event(&mut self, event: &FsEvent, now: Instant) -> Option<ProjectEvent> {
        let route = classify(&self.root, &event.path)?;
        self.state = ReconcileState::DebouncePending {
            deadline: now + self.debounce,
        };
        debug!(path = %event.path.display(), kind = ?event.kind, route = ?route, "change queued");

        if route != ChangeRoute::TaskFile || event.kind == ChangeKind::Deleted {
            return None;
        }
        match load_task_file(&event.path) {
            Ok(task) => Some(ProjectEvent::TaskChanged {
                task: Box::new(task),
                kind: event.kind,
            }),
            Err(e) => {
                debug!("fast path skipped: {}", e);
                None
            }
        }
    }

    /// Rebuild if the debounce deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<ProjectEvent> {
        match self.state {
            ReconcileState::DebouncePending { deadline } if now >= deadline => Some(self.reload()),
            _ => None,
        }
    }

    /// Rebuild the graph now. On failure the previous snapshot is kept.
    pub fn reload(&mut self) -> ProjectEvent {
        self.state = ReconcileState::Reloading;
        let event = match load_project(&self.root) {
            Ok(graph) => {
                info!(tasks = graph.tasks().len(), "project reloaded");
                self.snapshot = Arc::new(graph);
                ProjectEvent::ProjectChanged(Arc::clone(&self.snapshot))
            }
            Err(e) => {
                error!("reload failed: {}", e);
                ProjectEvent::ReloadFailed(e.to_string())
            }
        };
        self.state = ReconcileState::Idle;
        event
    }

    /// Drop any pending reload
    pub fn cancel(&mut self) {
        self.state = ReconcileState::Idle;
    }
}

/// Owner of a running reconciler thread. Dropping the handle shuts the
/// thread down and cancels any pending reload.
pub struct ReconcilerHandle {
    tx: Sender<ReconcileInput>,
    thread: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// A sender for feeding events into the loop
    pub fn input(&self) -> Sender<ReconcileInput> {
        self.tx.clone()
    }

    pub fn reload_now(&self) {
        let _ = self.tx.send(ReconcileInput::ReloadNow);
    }

    /// Stop the loop and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(ReconcileInput::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run `reconciler` on its own thread. Returns the handle and the receiver
/// on which [`ProjectEvent`]s are published.
///
/// Inputs are handled one at a time, so a rebuild can never overlap another.
pub fn spawn(reconciler: Reconciler) -> (ReconcilerHandle, Receiver<ProjectEvent>) {
    let (tx, rx) = mpsc::channel();
    let (events_tx, events_rx) = mpsc::channel();
    let thread = thread::spawn(move || run_loop(reconciler, rx, events_tx));
    (
        ReconcilerHandle {
            tx,
            thread: Some(thread),
        },
        events_rx,
    )
}

fn run_loop(
    mut reconciler: Reconciler,
    inputs: Receiver<ReconcileInput>,
    events: Sender<ProjectEvent>,
) {
    let mut watching = true;
    loop {
        let input = match reconciler.deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match inputs.recv_timeout(wait) {
                    Ok(input) => Some(input),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match inputs.recv() {
                Ok(input) => Some(input),
                Err(_) => break,
            },
        };

        let outgoing = match input {
            None => reconciler.poll(Instant::now()),
            Some(ReconcileInput::Fs(event)) if watching => {
                reconciler.on_event(&event, Instant::now())
            }
            Some(ReconcileInput::Fs(_)) => None,
            Some(ReconcileInput::ReloadNow) => {
                reconciler.cancel();
                Some(reconciler.reload())
            }
            Some(ReconcileInput::WatchFailed(message)) => {
                if !watching {
                    continue;
                }
                error!("file watching stopped: {}", message);
                watching = false;
                reconciler.cancel();
                if events.send(ProjectEvent::WatchFailed(message)).is_err() {
                    break;
                }
                Some(ProjectEvent::WatchingStopped)
            }
            Some(ReconcileInput::Shutdown) => break,
        };

        if let Some(event) = outgoing
            && events.send(event).is_err()
        {
            break;
        }
    }
    reconciler.cancel();
    debug!("reconciler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::project_io::build_project;
    use std::fs;
    use tempfile::TempDir;

    fn task_doc(id: &str, title: &str) -> String {
        format!(
            "---\nid: {id}\ntitle: {title}\nstatus: pending\npriority: high\nfeature: Core\ndependencies: []\ncreated_at: 2025-01-01\n---\n"
        )
    }

    fn setup() -> (TempDir, Arc<ProjectGraph>) {
        let tmp = TempDir::new().unwrap();
        let tasks = tmp.path().join(MARKER_DIR).join(TASKS_DIR);
        fs::create_dir_all(&tasks).unwrap();
        fs::write(tasks.join("task1_first.md"), task_doc("1", "First")).unwrap();
        let graph = Arc::new(build_project(tmp.path()).unwrap());
        (tmp, graph)
    }

    fn task_path(tmp: &TempDir, name: &str) -> PathBuf {
        tmp.path().join(MARKER_DIR).join(TASKS_DIR).join(name)
    }

    #[test]
    fn routes_by_location() {
        let root = Path::new("/p");
        assert_eq!(
            classify(root, Path::new("/p/.ai/tasks/task1_a.md")),
            Some(ChangeRoute::TaskFile)
        );
        assert_eq!(
            classify(root, Path::new("/p/.ai/plans/features/x.md")),
            Some(ChangeRoute::PlanFile)
        );
        assert_eq!(
            classify(root, Path::new("/p/.ai/TASKS.md")),
            Some(ChangeRoute::IndexFile)
        );
        assert_eq!(
            classify(root, Path::new("/p/.ai/memory/notes.txt")),
            Some(ChangeRoute::Other)
        );
        assert_eq!(classify(root, Path::new("/p/src/main.rs")), None);
    }

    #[test]
    fn burst_of_events_collapses_into_one_rebuild() {
        let (tmp, graph) = setup();
        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        let start = Instant::now();
        let path = tmp.path().join(MARKER_DIR).join("TASKS.md");

        for i in 0..5 {
            let now = start + Duration::from_millis(i * 50);
            rec.on_event(&FsEvent::new(&path, ChangeKind::Modified), now);
            assert!(rec.poll(now).is_none());
        }
        let last = start + Duration::from_millis(200);
        assert!(rec.poll(last + Duration::from_millis(299)).is_none());

        let mut rebuilds = 0;
        for ms in [300u64, 350, 600, 1000] {
            if let Some(ProjectEvent::ProjectChanged(_)) = rec.poll(last + Duration::from_millis(ms)) {
                rebuilds += 1;
            }
        }
        assert_eq!(rebuilds, 1);
        assert_eq!(rec.state(), ReconcileState::Idle);
    }

    #[test]
    fn events_outside_marker_are_ignored() {
        let (tmp, graph) = setup();
        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        rec.on_event(
            &FsEvent::new(tmp.path().join("README.md"), ChangeKind::Modified),
            Instant::now(),
        );
        assert_eq!(rec.state(), ReconcileState::Idle);
    }

    #[test]
    fn task_file_fast_path_then_full_rebuild() {
        let (tmp, graph) = setup();
        let path = task_path(&tmp, "task2_second.md");
        fs::write(&path, task_doc("2", "Second")).unwrap();

        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        let now = Instant::now();
        match rec.on_event(&FsEvent::new(&path, ChangeKind::Added), now) {
            Some(ProjectEvent::TaskChanged { task, kind }) => {
                assert_eq!(task.title, "Second");
                assert_eq!(kind, ChangeKind::Added);
            }
            other => panic!("expected fast path, got {:?}", other),
        }
        assert!(matches!(rec.state(), ReconcileState::DebouncePending { .. }));

        match rec.poll(now + DEFAULT_DEBOUNCE) {
            Some(ProjectEvent::ProjectChanged(graph)) => {
                assert_eq!(graph.tasks().len(), 2);
            }
            other => panic!("expected rebuild, got {:?}", other),
        }
    }

    #[test]
    fn deleted_task_skips_fast_path_but_rebuilds() {
        let (tmp, graph) = setup();
        let path = task_path(&tmp, "task1_first.md");
        fs::remove_file(&path).unwrap();

        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        let now = Instant::now();
        assert!(rec.on_event(&FsEvent::new(&path, ChangeKind::Deleted), now).is_none());
        match rec.poll(now + DEFAULT_DEBOUNCE) {
            Some(ProjectEvent::ProjectChanged(graph)) => assert!(graph.tasks().is_empty()),
            other => panic!("expected rebuild, got {:?}", other),
        }
    }

    #[test]
    fn unparseable_task_file_still_rebuilds() {
        let (tmp, graph) = setup();
        let path = task_path(&tmp, "task3_broken.md");
        fs::write(&path, "no frontmatter").unwrap();

        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        let now = Instant::now();
        assert!(rec.on_event(&FsEvent::new(&path, ChangeKind::Modified), now).is_none());
        match rec.poll(now + DEFAULT_DEBOUNCE) {
            Some(ProjectEvent::ProjectChanged(graph)) => {
                assert_eq!(graph.tasks().len(), 1);
                assert_eq!(graph.warnings().len(), 1);
            }
            other => panic!("expected rebuild, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failed_rebuild_keeps_previous_snapshot() {
        use std::os::unix::fs::PermissionsExt;

        let (tmp, graph) = setup();
        let tasks_dir = tmp.path().join(MARKER_DIR).join(TASKS_DIR);
        fs::set_permissions(&tasks_dir, fs::Permissions::from_mode(0o000)).unwrap();
        // Root ignores permission bits; nothing to test there.
        if fs::read_dir(&tasks_dir).is_ok() {
            fs::set_permissions(&tasks_dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut rec = Reconciler::new(Arc::clone(&graph), DEFAULT_DEBOUNCE);
        let event = rec.reload();
        fs::set_permissions(&tasks_dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(event, ProjectEvent::ReloadFailed(_)));
        assert!(Arc::ptr_eq(rec.snapshot(), &graph));
        assert_eq!(rec.state(), ReconcileState::Idle);
    }

    #[test]
    fn removed_marker_reloads_as_no_project() {
        let (tmp, graph) = setup();
        fs::remove_dir_all(tmp.path().join(MARKER_DIR)).unwrap();

        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        match rec.reload() {
            ProjectEvent::ProjectChanged(graph) => {
                assert!(!graph.is_valid());
                assert!(graph.tasks().is_empty());
            }
            other => panic!("expected rebuild, got {:?}", other),
        }
    }

    #[test]
    fn threaded_loop_debounces_burst() {
        let (tmp, graph) = setup();
        let (handle, events) = spawn(Reconciler::new(graph, Duration::from_millis(100)));
        let input = handle.input();
        let index = tmp.path().join(MARKER_DIR).join(INDEX_FILE);
        for _ in 0..5 {
            input
                .send(ReconcileInput::Fs(FsEvent::new(&index, ChangeKind::Modified)))
                .unwrap();
        }

        let first = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, ProjectEvent::ProjectChanged(_)));
        assert!(events.recv_timeout(Duration::from_millis(400)).is_err());
        handle.stop();
    }

    #[test]
    fn shutdown_cancels_pending_reload() {
        let (tmp, graph) = setup();
        let (handle, events) = spawn(Reconciler::new(graph, Duration::from_millis(200)));
        let index = tmp.path().join(MARKER_DIR).join(INDEX_FILE);
        handle
            .input()
            .send(ReconcileInput::Fs(FsEvent::new(&index, ChangeKind::Modified)))
            .unwrap();
        handle.stop();
        // The loop has exited and dropped its sender without emitting.
        assert!(events.recv().is_err());
    }

    #[test]
    fn reload_now_skips_debounce() {
        let (_tmp, graph) = setup();
        let (handle, events) = spawn(Reconciler::new(graph, Duration::from_secs(60)));
        handle.reload_now();
        let event = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, ProjectEvent::ProjectChanged(_)));
    }

    #[test]
    fn feed_failure_stops_watching() {
        let (tmp, graph) = setup();
        let (handle, events) = spawn(Reconciler::new(graph, Duration::from_millis(50)));
        let input = handle.input();
        input
            .send(ReconcileInput::WatchFailed("inotify limit".into()))
            .unwrap();
        assert!(matches!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            ProjectEvent::WatchFailed(m) if m == "inotify limit"
        ));
        assert!(matches!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            ProjectEvent::WatchingStopped
        ));

        // File events after the failure no longer schedule rebuilds
        let index = tmp.path().join(MARKER_DIR).join(INDEX_FILE);
        input
            .send(ReconcileInput::Fs(FsEvent::new(&index, ChangeKind::Modified)))
            .unwrap();
        assert!(events.recv_timeout(Duration::from_millis(300)).is_err());
        handle.stop();
        assert!(events.recv().is_err());
    }

    #[test]
    fn reload_now_still_works_after_feed_failure() {
        let (tmp, graph) = setup();
        let (handle, events) = spawn(Reconciler::new(graph, DEFAULT_DEBOUNCE));
        handle
            .input()
            .send(ReconcileInput::WatchFailed("x".into()))
            .unwrap();
        assert!(matches!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            ProjectEvent::WatchFailed(_)
        ));
        assert!(matches!(
            events.recv_timeout(Duration::from_secs(5)).unwrap(),
            ProjectEvent::WatchingStopped
        ));

        fs::write(task_path(&tmp, "task2_second.md"), task_doc("2", "Second")).unwrap();
        handle.reload_now();
        match events.recv_timeout(Duration::from_secs(5)) {
            Ok(ProjectEvent::ProjectChanged(graph)) => assert_eq!(graph.tasks().len(), 2),
            other => panic!("expected rebuild, got {:?}", other),
        }
        handle.stop();
    }

    #[test]
    fn stray_markdown_under_tasks_skips_fast_path() {
        let (tmp, graph) = setup();
        let tasks = tmp.path().join(MARKER_DIR).join(TASKS_DIR);
        fs::create_dir_all(tasks.join("archive")).unwrap();
        let nested = tasks.join("archive").join("task9_old.md");
        let misnamed = tasks.join("notes.md");
        fs::write(&nested, task_doc("9", "Old")).unwrap();
        fs::write(&misnamed, task_doc("8", "Notes")).unwrap();

        assert_eq!(classify(tmp.path(), &nested), Some(ChangeRoute::Other));
        assert_eq!(classify(tmp.path(), &misnamed), Some(ChangeRoute::Other));

        let mut rec = Reconciler::new(graph, DEFAULT_DEBOUNCE);
        let now = Instant::now();
        assert!(rec.on_event(&FsEvent::new(&nested, ChangeKind::Added), now).is_none());
        assert!(rec.on_event(&FsEvent::new(&misnamed, ChangeKind::Modified), now).is_none());
        // Still a full rebuild, which loads neither file
        match rec.poll(now + DEFAULT_DEBOUNCE) {
            Some(ProjectEvent::ProjectChanged(graph)) => assert_eq!(graph.tasks().len(), 1),
            other => panic!("expected rebuild, got {:?}", other),
        }
    }
}
