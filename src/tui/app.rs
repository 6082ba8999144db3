use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{debug, warn};

use crate::io::project_io::load_project;
use crate::io::reconciler::ProjectEvent;
use crate::io::watcher::ProjectWatcher;
use crate::model::config::{Config, UiConfig};
use crate::model::project::ProjectGraph;
use crate::model::task::{Task, TaskId};
use crate::ops::deps;
use crate::ops::view::{self, SortKey, StatusFilter, ViewCriteria, ViewResult};

use super::input;
use super::render;
use super::theme::Theme;

/// How many visited tasks the detail view remembers
pub const MAX_BREADCRUMBS: usize = 16;

/// Which view is currently displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Summary header + task table
    Overview,
    /// One task with its dependency tree and dependents
    Detail(TaskId),
    /// Plan documents
    Plans,
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Off,
    Watching,
    Failed,
}

/// Task ids visited before the current detail view, oldest first.
/// Bounded: once full, the oldest entry is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breadcrumbs {
    ids: Vec<TaskId>,
}

impl Breadcrumbs {
    pub fn push(&mut self, id: TaskId) {
        if self.ids.last() == Some(&id) {
            return;
        }
        if self.ids.len() == MAX_BREADCRUMBS {
            self.ids.remove(0);
        }
        self.ids.push(id);
    }

    pub fn pop(&mut self) -> Option<TaskId> {
        self.ids.pop()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget ids that are no longer in the graph
    pub fn retain_known(&mut self, graph: &ProjectGraph) {
        self.ids.retain(|id| graph.task(id).is_some());
    }
}

/// Cursor and scroll offset for one list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListState {
    pub cursor: usize,
    pub scroll: usize,
}

impl ListState {
    pub fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor as isize + delta;
        self.cursor = target.clamp(0, len as isize - 1) as usize;
    }

    pub fn to_bottom(&mut self, len: usize) {
        self.cursor = len.saturating_sub(1);
    }

    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Adjust the scroll offset so the cursor is inside a window of `height` rows
    pub fn scroll_into_view(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + height {
            self.scroll = self.cursor + 1 - height;
        }
    }
}

/// Main application state
pub struct App {
    /// Latest snapshot; replaced wholesale on every reload
    pub graph: Arc<ProjectGraph>,
    pub criteria: ViewCriteria,
    pub view: View,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    /// Help overlay visible
    pub show_help: bool,
    pub overview: ListState,
    /// Cursor over the dependency/dependent links of the detail view
    pub detail: ListState,
    pub plans: ListState,
    /// Line offset into the selected plan's content
    pub plan_scroll: usize,
    pub breadcrumbs: Breadcrumbs,
    pub watch_state: WatchState,
    /// Most recent reload or watch failure, cleared by the next good reload
    pub last_error: Option<String>,
    /// Set by the `r` key; consumed by the event loop
    pub reload_requested: bool,
}

impl App {
    pub fn new(graph: Arc<ProjectGraph>, ui: &UiConfig) -> Self {
        let criteria = ViewCriteria {
            status: StatusFilter::parse(&ui.default_filter).unwrap_or_default(),
            search: String::new(),
            sort: SortKey::parse(&ui.default_sort).unwrap_or_default(),
        };
        App {
            graph,
            criteria,
            view: View::Overview,
            mode: Mode::Navigate,
            should_quit: false,
            theme: Theme::from_config(ui),
            show_help: false,
            overview: ListState::default(),
            detail: ListState::default(),
            plans: ListState::default(),
            plan_scroll: 0,
            breadcrumbs: Breadcrumbs::default(),
            watch_state: WatchState::Off,
            last_error: None,
            reload_requested: false,
        }
    }

    /// Project the current snapshot with the current criteria
    pub fn rows(&self) -> ViewResult<'_> {
        view::project(&self.graph, &self.criteria)
    }

    /// Task under the overview cursor
    pub fn selected_task(&self) -> Option<&Task> {
        self.rows().rows.get(self.overview.cursor).map(|r| r.task)
    }

    /// Task shown by the detail view, if it still exists
    pub fn detail_task(&self) -> Option<&Task> {
        match &self.view {
            View::Detail(id) => self.graph.task(id),
            _ => None,
        }
    }

    /// Tasks the detail view can jump to: the dependency tree (by level),
    /// then the dependents.
    pub fn detail_links(&self) -> Vec<&Task> {
        let Some(task) = self.detail_task() else {
            return Vec::new();
        };
        let mut links: Vec<&Task> = deps::dependency_tree(&self.graph, &task.id)
            .into_iter()
            .map(|e| e.task)
            .collect();
        links.extend(deps::dependents(&self.graph, &task.id));
        links
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Show a task, remembering the one currently shown
    pub fn open_detail(&mut self, id: TaskId) {
        if let View::Detail(current) = &self.view {
            if *current == id {
                return;
            }
            self.breadcrumbs.push(current.clone());
        } else {
            self.breadcrumbs.clear();
        }
        self.view = View::Detail(id);
        self.detail = ListState::default();
    }

    /// Step back one level: previous task, else the overview
    pub fn back(&mut self) {
        match &self.view {
            View::Detail(_) => match self.breadcrumbs.pop() {
                Some(prev) => {
                    self.view = View::Detail(prev);
                    self.detail = ListState::default();
                }
                None => self.view = View::Overview,
            },
            View::Plans => self.view = View::Overview,
            View::Overview => {}
        }
    }

    pub fn show_overview(&mut self) {
        self.breadcrumbs.clear();
        self.view = View::Overview;
    }

    pub fn show_plans(&mut self) {
        self.breadcrumbs.clear();
        self.view = View::Plans;
        self.plans.clamp(self.graph.plans().len());
    }

    /// Move the plan selection, returning to the top of the new plan
    pub fn move_plan(&mut self, delta: isize) {
        let before = self.plans.cursor;
        self.plans.move_by(delta, self.graph.plans().len());
        if self.plans.cursor != before {
            self.plan_scroll = 0;
        }
    }

    // -----------------------------------------------------------------------
    // Criteria
    // -----------------------------------------------------------------------

    pub fn set_filter(&mut self, status: StatusFilter) {
        self.criteria.status = status;
        self.overview = ListState::default();
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.criteria.status.next());
    }

    pub fn cycle_sort(&mut self) {
        self.criteria.sort = self.criteria.sort.next();
        self.overview = ListState::default();
    }

    pub fn set_search(&mut self, query: String) {
        self.criteria.search = query;
        self.overview = ListState::default();
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Swap in a new graph, keeping cursors and history valid
    pub fn apply_snapshot(&mut self, graph: Arc<ProjectGraph>) {
        self.graph = graph;
        self.breadcrumbs.retain_known(&self.graph);
        while let View::Detail(id) = &self.view {
            if self.graph.task(id).is_some() {
                break;
            }
            self.back();
        }
        let rows = self.rows().rows.len();
        self.overview.clamp(rows);
        let links = self.detail_links().len();
        self.detail.clamp(links);
        self.plans.clamp(self.graph.plans().len());
    }

    pub fn handle_project_event(&mut self, event: ProjectEvent) {
        match event {
            ProjectEvent::WatchingStarted => self.watch_state = WatchState::Watching,
            ProjectEvent::TaskChanged { task, kind } => {
                debug!(id = %task.id, ?kind, "task changed");
            }
            ProjectEvent::ProjectChanged(graph) => {
                self.apply_snapshot(graph);
                self.last_error = None;
            }
            ProjectEvent::ReloadFailed(message) => self.last_error = Some(message),
            ProjectEvent::WatchFailed(message) => {
                self.watch_state = WatchState::Failed;
                self.last_error = Some(message);
            }
            ProjectEvent::WatchingStopped => {
                if self.watch_state != WatchState::Failed {
                    self.watch_state = WatchState::Off;
                }
            }
        }
    }
}

/// Run the TUI application
pub fn run(graph: ProjectGraph, config: Config, watch: bool) -> Result<(), Box<dyn std::error::Error>> {
    let graph = Arc::new(graph);
    let mut app = App::new(Arc::clone(&graph), &config.ui);

    let mut watcher = None;
    if watch && config.watch.enabled {
        let debounce = Duration::from_millis(config.watch.debounce_ms);
        match ProjectWatcher::start(graph, debounce) {
            Ok(w) => watcher = Some(w),
            Err(e) => {
                warn!("{}", e);
                app.watch_state = WatchState::Failed;
                app.last_error = Some(e.to_string());
            }
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Run event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut watcher);

    if let Some(w) = watcher {
        w.stop();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: &mut Option<ProjectWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if let Some(w) = watcher.as_mut() {
            for evt in w.poll() {
                app.handle_project_event(evt);
            }
        }

        if std::mem::take(&mut app.reload_requested) {
            match watcher.as_ref() {
                Some(w) => w.reload_now(),
                None => reload_in_place(app),
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Rebuild synchronously when no watcher is running
fn reload_in_place(app: &mut App) {
    match load_project(app.graph.root()) {
        Ok(graph) => {
            app.apply_snapshot(Arc::new(graph));
            app.last_error = None;
        }
        Err(e) => {
            warn!("reload failed: {}", e);
            app.last_error = Some(e.to_string());
        }
    }
}
