//! The dashboard state and the reducer that drives it.
//!
//! [`Explorer::update`] is the only place state changes. It never talks to
//! git itself: every slow operation is returned as a [`Command`] and comes
//! back later as a [`Msg`].

mod content;
mod shortcuts;
mod summary;
mod view;

#[cfg(test)]
mod tests;

use std::time::Duration;

use tracing::{debug, info};

use crate::command::{Command, ContentRequest, Dispatcher, RefreshRequest, Snapshot};
use crate::error::ErrorInfo;
use crate::event::{Event, Key, Size};
use crate::gateway::FileStatusEntry;
use crate::modal::{ModalController, ModalOutcome};
use crate::program::{Program, Transition};
use crate::render::Layout;
use crate::rows::{CollapseState, Row, build_rows, is_expanded};
use crate::viewport;

pub use shortcuts::{Action, help_lines};
pub use summary::summarize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Explorer,
    Diff,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Explorer => Mode::Diff,
            Mode::Diff => Mode::Explorer,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Explorer => "Explorer",
            Mode::Diff => "Diff",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Files,
    Content,
}

impl Focus {
    pub fn toggled(self) -> Self {
        match self {
            Focus::Files => Focus::Content,
            Focus::Content => Focus::Files,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorerConfig {
    /// Zero disables the periodic refresh.
    pub refresh_period: Duration,
    pub theme: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            refresh_period: Duration::from_secs(2),
            theme: "default".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    Started,
    Key(Key),
    Resized(Size),
    Tick,
    Refreshed {
        request: RefreshRequest,
        result: Result<Snapshot, ErrorInfo>,
    },
    ContentLoaded {
        request: ContentRequest,
        result: Result<String, ErrorInfo>,
    },
    Committed {
        ticket: u64,
        result: Result<(), ErrorInfo>,
    },
    Pushed {
        ticket: u64,
        result: Result<(), ErrorInfo>,
    },
}

/// Outcome of one reducer step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Continue(Vec<Command>),
    Quit,
}

impl Step {
    fn none() -> Self {
        Step::Continue(Vec::new())
    }

    fn one(command: Command) -> Self {
        Step::Continue(vec![command])
    }
}

impl From<Option<Command>> for Step {
    fn from(command: Option<Command>) -> Self {
        Step::Continue(command.into_iter().collect())
    }
}

#[derive(Debug)]
pub struct Explorer {
    config: ExplorerConfig,
    focus: Focus,
    mode: Mode,
    modal: ModalController,
    files: Vec<FileStatusEntry>,
    rows: Vec<Row>,
    collapse: CollapseState,
    selected: usize,
    file_offset: usize,
    raw_content: String,
    /// Path whose content is currently shown.
    content_path: Option<String>,
    content_lines: Vec<String>,
    content_offset: usize,
    summary: String,
    last_error: Option<ErrorInfo>,
    show_ignored: bool,
    size: Size,
    refresh_generation: u64,
    content_generation: u64,
}

impl Explorer {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            focus: Focus::Files,
            mode: Mode::Explorer,
            modal: ModalController::new(),
            files: Vec::new(),
            rows: Vec::new(),
            collapse: CollapseState::new(),
            selected: 0,
            file_offset: 0,
            raw_content: String::new(),
            content_path: None,
            content_lines: Vec::new(),
            content_offset: 0,
            summary: String::new(),
            last_error: None,
            show_ignored: false,
            size: Size::default(),
            refresh_generation: 0,
            content_generation: 0,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn modal(&self) -> &ModalController {
        &self.modal
    }

    pub fn files(&self) -> &[FileStatusEntry] {
        &self.files
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected)
    }

    pub fn selected_path(&self) -> Option<&str> {
        self.selected_row().map(|row| row.path.as_str())
    }

    pub fn file_offset(&self) -> usize {
        self.file_offset
    }

    pub fn content_lines(&self) -> &[String] {
        &self.content_lines
    }

    pub fn content_offset(&self) -> usize {
        self.content_offset
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn last_error(&self) -> Option<&ErrorInfo> {
        self.last_error.as_ref()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn layout(&self) -> Layout {
        Layout::new(self.size)
    }

    pub fn update(&mut self, msg: Msg) -> Step {
        match msg {
            Msg::Started => {
                info!(
                    "starting explorer (refresh every {:?}, theme {})",
                    self.config.refresh_period, self.config.theme
                );
                let mut commands = vec![self.refresh()];
                commands.extend(self.schedule_tick());
                Step::Continue(commands)
            }
            Msg::Key(key) => self.handle_key(key),
            Msg::Resized(size) => {
                self.size = size;
                self.reshape_content();
                self.file_offset = self.files_offset_for(self.selected);
                Step::none()
            }
            Msg::Tick => {
                let mut commands = vec![self.refresh()];
                commands.extend(self.schedule_tick());
                Step::Continue(commands)
            }
            Msg::Refreshed { request, result } => self.on_refreshed(request, result),
            Msg::ContentLoaded { request, result } => {
                self.on_content_loaded(request, result);
                Step::none()
            }
            Msg::Committed { ticket, result } => self.on_committed(ticket, result),
            Msg::Pushed { ticket, result } => self.on_pushed(ticket, result),
        }
    }

    fn handle_key(&mut self, key: Key) -> Step {
        if shortcuts::is_force_quit(key) {
            return Step::Quit;
        }

        if self.modal.is_open() {
            return match self.modal.handle_key(key) {
                ModalOutcome::Stay | ModalOutcome::Closed => Step::none(),
                ModalOutcome::Commit { ticket, message } => {
                    Step::one(Command::Commit { ticket, message })
                }
                ModalOutcome::Push { ticket } => Step::one(Command::Push { ticket }),
            };
        }

        match shortcuts::action_for(key) {
            Some(action) => self.apply(action),
            None => Step::none(),
        }
    }

    fn apply(&mut self, action: Action) -> Step {
        match action {
            Action::Quit => Step::Quit,
            Action::ToggleFocus => {
                self.focus = self.focus.toggled();
                Step::none()
            }
            Action::ToggleMode => {
                self.mode = self.mode.toggled();
                // Results issued for the previous mode no longer apply.
                self.content_generation += 1;
                self.content_path = None;
                self.reshape_content();
                Step::one(self.refresh())
            }
            Action::MoveUp => self.move_by(-1),
            Action::MoveDown => self.move_by(1),
            Action::PageUp => self.move_by(-self.page_height()),
            Action::PageDown => self.move_by(self.page_height()),
            Action::Expand => self.set_selected_collapsed(false),
            Action::Collapse => self.collapse_selected(),
            Action::ToggleDirectory => match self.selected_row() {
                Some(row) if row.is_dir => {
                    let collapsed = row.collapsed;
                    self.set_selected_collapsed(!collapsed)
                }
                _ => Step::none(),
            },
            Action::OpenCommit => {
                self.modal.open_commit();
                Step::none()
            }
            Action::OpenHelp => {
                self.modal.open_help();
                Step::none()
            }
            Action::Refresh => Step::one(self.refresh()),
            Action::ToggleIgnored => {
                self.show_ignored = !self.show_ignored;
                match self.mode {
                    Mode::Explorer => Step::one(self.refresh()),
                    Mode::Diff => Step::none(),
                }
            }
        }
    }

    fn page_height(&self) -> isize {
        let layout = self.layout();
        let visible = match self.focus {
            Focus::Files => layout.files_visible(),
            Focus::Content => layout.content_visible(),
        };
        isize::try_from(visible.max(1)).unwrap_or(isize::MAX)
    }

    fn move_by(&mut self, delta: isize) -> Step {
        match self.focus {
            Focus::Files => self.move_selection(delta).into(),
            Focus::Content => {
                self.content_offset = viewport::scroll(
                    self.content_offset,
                    delta,
                    self.content_lines.len(),
                    self.layout().content_visible(),
                );
                Step::none()
            }
        }
    }

    fn move_selection(&mut self, delta: isize) -> Option<Command> {
        if self.rows.is_empty() {
            self.selected = 0;
            self.file_offset = 0;
            return None;
        }

        let next = viewport::step(self.selected, delta, self.rows.len());
        if next == self.selected {
            return None;
        }
        self.select(next);
        self.fetch_selected(false)
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.file_offset = self.files_offset_for(index);
    }

    fn files_offset_for(&self, selected: usize) -> usize {
        let visible = self.layout().files_visible();
        let total = self.rows.len();
        let offset = viewport::clamp(self.file_offset, total, visible);
        viewport::ensure_visible(selected, offset, visible, total)
    }

    fn set_selected_collapsed(&mut self, collapsed: bool) -> Step {
        let Some(row) = self.selected_row() else {
            return Step::none();
        };
        if !row.is_dir || row.collapsed == collapsed {
            return Step::none();
        }

        let path = row.path.clone();
        self.collapse.insert(path.clone(), collapsed);
        self.rebuild_rows(Some(&path), true);
        Step::none()
    }

    /// Collapse the selected directory, or the parent of anything else and
    /// move the selection onto it.
    fn collapse_selected(&mut self) -> Step {
        let Some(row) = self.selected_row() else {
            return Step::none();
        };
        if row.is_dir && is_expanded(&self.collapse, &row.path) {
            return self.set_selected_collapsed(true);
        }

        let Some(parent) = row.parent().map(str::to_string) else {
            return Step::none();
        };
        self.collapse.insert(parent.clone(), true);
        self.rebuild_rows(Some(&parent), true);
        self.fetch_selected(false).into()
    }

    /// Re-project rows and put the selection back on `keep` (or its closest
    /// visible ancestor). `keep_dir` picks between a file and a directory
    /// sharing the path.
    fn rebuild_rows(&mut self, keep: Option<&str>, keep_dir: bool) {
        self.rows = build_rows(&self.files, &self.collapse);
        let index = keep
            .and_then(|path| self.index_for_path(path, keep_dir))
            .unwrap_or(0);
        self.select(index);
    }

    fn index_for_path(&self, path: &str, keep_dir: bool) -> Option<usize> {
        let exact = self
            .rows
            .iter()
            .position(|row| row.path == path && row.is_dir == keep_dir)
            .or_else(|| self.rows.iter().position(|row| row.path == path));
        if exact.is_some() {
            return exact;
        }

        let mut candidate = path.rsplit_once('/').map(|(parent, _)| parent);
        while let Some(parent) = candidate {
            if let Some(index) = self
                .rows
                .iter()
                .position(|row| row.path == parent && row.is_dir)
            {
                return Some(index);
            }
            candidate = parent.rsplit_once('/').map(|(parent, _)| parent);
        }
        None
    }

    fn refresh(&mut self) -> Command {
        self.refresh_generation += 1;
        Command::Refresh(RefreshRequest {
            generation: self.refresh_generation,
            mode: self.mode,
            keep_path: self.selected_path().map(str::to_string),
            include_ignored: self.show_ignored && self.mode == Mode::Explorer,
        })
    }

    fn schedule_tick(&self) -> Option<Command> {
        let period = self.config.refresh_period;
        (!period.is_zero()).then_some(Command::ScheduleTick { after: period })
    }

    /// Request content for the selected row. Directory rows and an empty
    /// tree clear the content pane instead.
    fn fetch_selected(&mut self, preserve_scroll: bool) -> Option<Command> {
        self.content_generation += 1;

        let Some(entry) = self.selected_row().and_then(|row| row.entry.clone()) else {
            self.content_path = None;
            self.raw_content.clear();
            self.content_lines.clear();
            self.content_offset = 0;
            self.last_error = None;
            return None;
        };

        Some(Command::FetchContent(ContentRequest {
            generation: self.content_generation,
            path: entry.path,
            status: entry.status,
            mode: self.mode,
            preserve_scroll,
        }))
    }

    fn on_refreshed(
        &mut self,
        request: RefreshRequest,
        result: Result<Snapshot, ErrorInfo>,
    ) -> Step {
        if request.generation != self.refresh_generation {
            debug!(
                "dropping stale refresh #{} (current #{})",
                request.generation, self.refresh_generation
            );
            return Step::none();
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(error) => {
                self.last_error = Some(error);
                return Step::none();
            }
        };

        info!(
            "refresh #{} applied: {} files",
            request.generation,
            snapshot.files.len()
        );
        self.summary = summarize(snapshot.branch.as_deref(), &snapshot.statuses);
        self.files = snapshot.files;
        self.last_error = None;

        // A selection made while the refresh was running wins over the one
        // captured when it was issued.
        let (keep, keep_dir) = match self.selected_row() {
            Some(row) => (Some(row.path.clone()), row.is_dir),
            None => (request.keep_path, false),
        };
        self.rebuild_rows(keep.as_deref(), keep_dir);

        let same_path =
            self.selected_path().is_some() && self.selected_path() == self.content_path.as_deref();
        self.fetch_selected(same_path).into()
    }

    fn on_content_loaded(&mut self, request: ContentRequest, result: Result<String, ErrorInfo>) {
        if request.generation != self.content_generation {
            debug!(
                "dropping stale content for {} (#{} vs #{})",
                request.path, request.generation, self.content_generation
            );
            return;
        }

        self.content_path = Some(request.path);
        match result {
            Ok(text) => {
                self.raw_content = text;
                self.last_error = None;
            }
            Err(error) => {
                self.raw_content.clear();
                self.last_error = Some(error);
            }
        }

        if !request.preserve_scroll {
            self.content_offset = 0;
        }
        self.reshape_content();
    }

    fn reshape_content(&mut self) {
        let layout = self.layout();
        self.content_lines =
            content::shape(&self.raw_content, self.mode, layout.content_text_width());
        self.content_offset = viewport::clamp(
            self.content_offset,
            self.content_lines.len(),
            layout.content_visible(),
        );
    }

    fn on_committed(&mut self, ticket: u64, result: Result<(), ErrorInfo>) -> Step {
        let applied = self
            .modal
            .on_commit_result(ticket, result.as_ref().err().map(|error| error.message.clone()));

        match result {
            // The working tree changed whether or not the modal is still open.
            Ok(()) => Step::one(self.refresh()),
            Err(error) => {
                if !applied {
                    debug!("commit finished after its modal was closed: {}", error.message);
                    self.last_error = Some(error);
                }
                Step::none()
            }
        }
    }

    fn on_pushed(&mut self, ticket: u64, result: Result<(), ErrorInfo>) -> Step {
        let applied = self
            .modal
            .on_push_result(ticket, result.as_ref().err().map(|error| error.message.clone()));

        match result {
            Ok(()) => Step::one(self.refresh()),
            Err(error) => {
                if !applied {
                    debug!("push finished after its modal was closed: {}", error.message);
                    self.last_error = Some(error);
                }
                Step::none()
            }
        }
    }
}

/// Wire an explorer to the terminal runtime: key and resize events become
/// messages and every command runs on `dispatcher`.
pub fn program(explorer: Explorer, dispatcher: Dispatcher) -> Program<Explorer, Msg> {
    Program::new(
        explorer,
        move |explorer: &mut Explorer, msg: Msg| match explorer.update(msg) {
            Step::Quit => Transition::Quit,
            Step::Continue(commands) if commands.is_empty() => Transition::Continue,
            Step::Continue(commands) => Transition::Batch(
                commands
                    .into_iter()
                    .map(|command| dispatcher.dispatch(command))
                    .collect(),
            ),
        },
        view::draw,
    )
    .map_event(|event| match event {
        Event::Key(key) => Some(Msg::Key(key)),
        Event::Resize(size) => Some(Msg::Resized(size)),
    })
    .with_init(Msg::Started)
}
