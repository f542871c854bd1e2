use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use termwiz::surface::Surface;

use super::*;
use crate::command::execute;
use crate::error::{ErrorKind, GatewayError};
use crate::event::KeyCode;
use crate::gateway::{GitGateway, StatusGateway};
use crate::modal::ModalState;

#[derive(Default)]
struct FakeGateway {
    files: Vec<FileStatusEntry>,
    statuses: Vec<FileStatusEntry>,
    contents: HashMap<String, String>,
    diffs: HashMap<String, String>,
    fail_listing: bool,
    commit_error: Option<String>,
    push_error: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    fn with_files(paths: &[&str]) -> Self {
        Self {
            files: paths.iter().map(|path| FileStatusEntry::clean(*path)).collect(),
            ..Self::default()
        }
    }

    fn content(mut self, path: &str, text: &str) -> Self {
        self.contents.insert(path.to_string(), text.to_string());
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn called(&self, prefix: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|call| call.starts_with(prefix))
    }

    fn failure(args: &str, detail: &str) -> GatewayError {
        GatewayError::Git {
            args: args.to_string(),
            detail: detail.to_string(),
        }
    }
}

impl StatusGateway for FakeGateway {
    fn list_files(&self, include_ignored: bool) -> Result<Vec<FileStatusEntry>, GatewayError> {
        self.record(format!("list_files({include_ignored})"));
        if self.fail_listing {
            return Err(Self::failure("ls-files", "not a git repository"));
        }
        Ok(self
            .files
            .iter()
            .filter(|entry| include_ignored || !entry.ignored)
            .cloned()
            .collect())
    }

    fn status(&self) -> Result<Vec<FileStatusEntry>, GatewayError> {
        self.record("status".to_string());
        Ok(self.statuses.clone())
    }

    fn diff(&self, path: &str, _status: &str) -> Result<String, GatewayError> {
        self.record(format!("diff({path})"));
        Ok(self.diffs.get(path).cloned().unwrap_or_default())
    }

    fn file_contents(&self, path: &str) -> Result<String, GatewayError> {
        self.record(format!("file_contents({path})"));
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                path: path.to_string(),
            })
    }

    fn commit(&self, message: &str) -> Result<(), GatewayError> {
        self.record(format!("commit({message})"));
        match &self.commit_error {
            Some(detail) => Err(Self::failure("commit", detail)),
            None => Ok(()),
        }
    }

    fn push(&self) -> Result<(), GatewayError> {
        self.record("push".to_string());
        match &self.push_error {
            Some(detail) => Err(Self::failure("push", detail)),
            None => Ok(()),
        }
    }

    fn branch_name(&self) -> Result<String, GatewayError> {
        Ok("main".to_string())
    }
}

/// Drives an explorer against a gateway, executing commands inline.
struct Harness<G> {
    explorer: Explorer,
    gateway: G,
    ticks: usize,
}

impl<G: StatusGateway> Harness<G> {
    fn new(gateway: G) -> Self {
        Self::with_config(
            gateway,
            ExplorerConfig {
                refresh_period: Duration::ZERO,
                ..ExplorerConfig::default()
            },
        )
    }

    fn with_config(gateway: G, config: ExplorerConfig) -> Self {
        let mut explorer = Explorer::new(config);
        explorer.update(Msg::Resized(Size::new(120, 20)));
        Self {
            explorer,
            gateway,
            ticks: 0,
        }
    }

    fn started(gateway: G) -> Self {
        let mut harness = Self::new(gateway);
        let commands = harness.send(Msg::Started);
        harness.run(commands);
        harness
    }

    fn send(&mut self, msg: Msg) -> Vec<Command> {
        match self.explorer.update(msg) {
            Step::Continue(commands) => commands,
            Step::Quit => panic!("unexpected quit"),
        }
    }

    fn key(&mut self, code: KeyCode) -> Vec<Command> {
        self.send(Msg::Key(Key::new(code)))
    }

    /// Press a key and run everything it triggers to completion.
    fn press(&mut self, code: KeyCode) {
        let commands = self.key(code);
        self.run(commands);
    }

    fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.press(KeyCode::Char(ch));
        }
    }

    fn run(&mut self, commands: Vec<Command>) {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            if let Command::ScheduleTick { .. } = command {
                self.ticks += 1;
                continue;
            }
            let msg = execute(&self.gateway, command);
            queue.extend(self.send(msg));
        }
    }

    fn row_paths(&self) -> Vec<&str> {
        self.explorer
            .rows()
            .iter()
            .map(|row| row.path.as_str())
            .collect()
    }

    fn screen(&self) -> Vec<String> {
        let size = self.explorer.size();
        let mut surface = Surface::new(usize::from(size.width), usize::from(size.height));
        view::draw(&self.explorer, &mut surface);
        surface
            .screen_chars_to_string()
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect()
    }
}

fn numbered_files(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("f{index:02}.txt")).collect()
}

#[test]
fn startup_lists_files_and_loads_first_file() {
    let gateway = FakeGateway::with_files(&["README.md", "src/lib.rs"]).content("README.md", "# wing");
    let harness = Harness::started(gateway);

    assert_eq!(harness.row_paths(), vec!["README.md", "src"]);
    assert_eq!(harness.explorer.selected_path(), Some("README.md"));
    assert_eq!(harness.explorer.content_lines(), ["# wing"]);
    assert_eq!(harness.explorer.summary(), "git: main clean");
    assert!(harness.explorer.last_error().is_none());
}

#[test]
fn every_timer_tick_refreshes_even_while_an_earlier_refresh_hangs() {
    let mut harness = Harness::with_config(
        FakeGateway::with_files(&["a.txt"]),
        ExplorerConfig {
            refresh_period: Duration::from_secs(2),
            ..ExplorerConfig::default()
        },
    );

    let commands = harness.send(Msg::Started);
    assert!(matches!(commands[0], Command::Refresh(_)));
    assert_eq!(
        commands[1],
        Command::ScheduleTick {
            after: Duration::from_secs(2)
        }
    );

    let mut generations = Vec::new();
    for _ in 0..5 {
        let tick = harness.send(Msg::Tick);
        let [Command::Refresh(request), Command::ScheduleTick { .. }] = &tick[..] else {
            panic!("expected a refresh and a re-armed timer, got {tick:?}");
        };
        generations.push(request.generation);
    }
    assert_eq!(generations, vec![2, 3, 4, 5, 6]);

    // The first refresh finally returns; it has been superseded.
    harness.run(commands);
    assert!(harness.explorer.files().is_empty());
}

#[test]
fn zero_period_disables_timer() {
    let mut harness = Harness::new(FakeGateway::with_files(&["a.txt"]));
    let commands = harness.send(Msg::Started);
    assert_eq!(commands.len(), 1);
}

#[test]
fn toggling_mode_keeps_focus_and_double_focus_toggle_restores_it() {
    let mut harness = Harness::started(FakeGateway::with_files(&["a.txt"]));
    let focus = harness.explorer.focus();

    harness.press(KeyCode::Char('m'));
    assert_eq!(harness.explorer.mode(), Mode::Diff);
    assert_eq!(harness.explorer.focus(), focus);

    harness.press(KeyCode::Char('m'));
    assert_eq!(harness.explorer.mode(), Mode::Explorer);
    assert_eq!(harness.explorer.focus(), focus);

    harness.press(KeyCode::Tab);
    assert_ne!(harness.explorer.focus(), focus);
    harness.press(KeyCode::Tab);
    assert_eq!(harness.explorer.focus(), focus);
}

#[test]
fn diff_mode_lists_only_pending_changes() {
    let mut gateway = FakeGateway::with_files(&["a.txt", "b.txt", "c.txt"]);
    gateway.statuses = vec![
        FileStatusEntry::new("b.txt", "M"),
        FileStatusEntry::new("new.txt", "??"),
    ];
    gateway
        .diffs
        .insert("b.txt".to_string(), "@@ -1 +1 @@\n-old\n+new".to_string());
    let mut harness = Harness::started(gateway);
    assert_eq!(harness.explorer.summary(), "git: main M1 ?1");

    harness.press(KeyCode::Char('m'));

    assert_eq!(harness.row_paths(), vec!["b.txt", "new.txt"]);
    assert_eq!(harness.explorer.selected_path(), Some("b.txt"));
    assert_eq!(harness.explorer.content_lines().len(), 3);
    assert!(harness.gateway.called("diff(b.txt)"));
}

#[test]
fn moving_selection_fetches_content_and_keeps_it_visible() {
    let paths = numbered_files(30);
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
    let mut gateway = FakeGateway::with_files(&paths);
    for path in &paths {
        gateway.contents.insert(path.to_string(), format!("contents of {path}"));
    }
    let mut harness = Harness::started(gateway);

    for _ in 0..25 {
        harness.press(KeyCode::Down);
    }
    assert_eq!(harness.explorer.selected(), 25);
    assert!(harness.explorer.file_offset() > 0);
    assert_eq!(harness.explorer.content_lines(), ["contents of f25.txt"]);

    harness.press(KeyCode::PageUp);
    harness.press(KeyCode::PageUp);
    assert_eq!(harness.explorer.selected(), 0);
    assert_eq!(harness.explorer.file_offset(), 0);

    harness.press(KeyCode::Up);
    assert_eq!(harness.explorer.selected(), 0);
}

#[test]
fn content_focus_scrolls_content_instead_of_selection() {
    let text = (0..50).map(|line| format!("line {line}")).collect::<Vec<_>>().join("\n");
    let gateway = FakeGateway::with_files(&["big.txt", "small.txt"]).content("big.txt", &text);
    let mut harness = Harness::started(gateway);
    harness.press(KeyCode::Tab);

    for _ in 0..5 {
        harness.press(KeyCode::Char('j'));
    }
    assert_eq!(harness.explorer.content_offset(), 5);
    assert_eq!(harness.explorer.selected(), 0);

    harness.press(KeyCode::PageDown);
    harness.press(KeyCode::PageDown);
    harness.press(KeyCode::PageDown);
    harness.press(KeyCode::PageDown);
    assert_eq!(harness.explorer.content_offset(), 50 - 13);

    harness.press(KeyCode::PageUp);
    harness.press(KeyCode::PageUp);
    harness.press(KeyCode::PageUp);
    harness.press(KeyCode::PageUp);
    assert_eq!(harness.explorer.content_offset(), 0);
}

#[test]
fn refresh_keeps_selected_path_and_scroll() {
    let text = (0..40).map(|line| format!("line {line}")).collect::<Vec<_>>().join("\n");
    let gateway = FakeGateway::with_files(&["b.txt", "c.txt"])
        .content("b.txt", &text)
        .content("c.txt", "c");
    let mut harness = Harness::started(gateway);
    harness.press(KeyCode::Tab);
    for _ in 0..4 {
        harness.press(KeyCode::Down);
    }
    harness.press(KeyCode::Tab);

    harness.gateway.files.insert(0, FileStatusEntry::clean("a.txt"));
    harness.press(KeyCode::Char('r'));

    assert_eq!(harness.explorer.selected_path(), Some("b.txt"));
    assert_eq!(harness.explorer.selected(), 1);
    assert_eq!(harness.explorer.content_offset(), 4);

    harness.press(KeyCode::Down);
    assert_eq!(harness.explorer.selected_path(), Some("c.txt"));
    assert_eq!(harness.explorer.content_offset(), 0);
}

#[test]
fn vanished_selection_falls_back_to_first_row() {
    let gateway = FakeGateway::with_files(&["a.txt", "b.txt"]).content("a.txt", "a");
    let mut harness = Harness::started(gateway);
    harness.press(KeyCode::Down);

    harness.gateway.files.pop();
    harness.press(KeyCode::Char('r'));

    assert_eq!(harness.explorer.selected(), 0);
    assert_eq!(harness.explorer.selected_path(), Some("a.txt"));
}

#[test]
fn stale_refresh_is_dropped() {
    let mut gateway = FakeGateway::with_files(&["a.txt", "b.txt"]);
    gateway.statuses = vec![FileStatusEntry::new("b.txt", "M")];
    let mut harness = Harness::new(gateway);

    let explorer_refresh = harness.send(Msg::Started);
    let diff_refresh = harness.key(KeyCode::Char('m'));

    let late = execute(&harness.gateway, explorer_refresh[0].clone());
    assert!(harness.send(late).is_empty());
    assert!(harness.explorer.files().is_empty());

    harness.run(diff_refresh);
    assert_eq!(harness.row_paths(), vec!["b.txt"]);
}

#[test]
fn stale_content_is_dropped() {
    let gateway = FakeGateway::with_files(&["a.txt", "b.txt", "c.txt"])
        .content("a.txt", "A")
        .content("b.txt", "B")
        .content("c.txt", "C");
    let mut harness = Harness::started(gateway);

    let fetch_b = harness.key(KeyCode::Down);
    let fetch_c = harness.key(KeyCode::Down);

    harness.run(fetch_b);
    assert_eq!(harness.explorer.content_lines(), ["A"]);

    harness.run(fetch_c);
    assert_eq!(harness.explorer.content_lines(), ["C"]);
}

#[test]
fn refresh_failure_keeps_existing_files() {
    let gateway = FakeGateway::with_files(&["a.txt"]).content("a.txt", "a");
    let mut harness = Harness::started(gateway);

    harness.gateway.fail_listing = true;
    harness.press(KeyCode::Char('r'));

    assert_eq!(harness.row_paths(), vec!["a.txt"]);
    let error = harness.explorer.last_error().expect("error recorded");
    assert_eq!(error.kind, ErrorKind::Gateway);

    let screen = harness.screen().join("\n");
    assert!(screen.contains("Error: git ls-files: not a git repository"));
}

#[test]
fn missing_file_surfaces_not_found() {
    let harness = Harness::started(FakeGateway::with_files(&["gone.txt"]));

    let error = harness.explorer.last_error().expect("error recorded");
    assert_eq!(error.kind, ErrorKind::NotFound);
    assert!(harness.explorer.content_lines().is_empty());
}

#[test]
fn whitespace_commit_message_stays_open_without_gateway_call() {
    let mut harness = Harness::started(FakeGateway::with_files(&["a.txt"]));

    harness.press(KeyCode::Enter);
    assert_eq!(harness.explorer.modal().state(), ModalState::Commit);

    harness.type_text("   ");
    let commands = harness.key(KeyCode::Enter);

    assert!(commands.is_empty());
    assert_eq!(harness.explorer.modal().state(), ModalState::Commit);
    assert!(!harness.explorer.modal().error().unwrap_or_default().is_empty());
    assert!(!harness.gateway.called("commit"));
}

#[test]
fn modal_swallows_navigation_keys() {
    let mut harness = Harness::started(FakeGateway::with_files(&["a.txt", "b.txt"]));
    harness.press(KeyCode::Enter);

    harness.type_text("jq");
    assert_eq!(harness.explorer.selected(), 0);
    assert_eq!(harness.explorer.modal().message(), "jq");
}

#[test]
fn commit_then_push_closes_modal_and_refreshes() {
    let mut harness = Harness::started(FakeGateway::with_files(&["a.txt"]));

    harness.press(KeyCode::Enter);
    harness.type_text("fix bug");
    harness.press(KeyCode::Enter);
    assert_eq!(harness.explorer.modal().state(), ModalState::Push);
    assert!(harness.gateway.called("commit(fix bug)"));

    harness.gateway.calls.lock().unwrap().clear();
    harness.press(KeyCode::Enter);

    assert_eq!(harness.explorer.modal().state(), ModalState::None);
    assert!(harness.gateway.called("push"));
    assert!(harness.gateway.called("list_files"));
}

#[test]
fn commit_failure_is_shown_in_modal() {
    let mut gateway = FakeGateway::with_files(&["a.txt"]).content("a.txt", "a");
    gateway.commit_error = Some("nothing to commit".to_string());
    let mut harness = Harness::started(gateway);

    harness.press(KeyCode::Enter);
    harness.type_text("msg");
    harness.press(KeyCode::Enter);

    assert_eq!(harness.explorer.modal().state(), ModalState::Commit);
    assert_eq!(
        harness.explorer.modal().error(),
        Some("git commit: nothing to commit")
    );
    assert!(harness.explorer.last_error().is_none());
}

#[test]
fn push_failure_is_retryable() {
    let mut gateway = FakeGateway::with_files(&["a.txt"]);
    gateway.push_error = Some("no upstream".to_string());
    let mut harness = Harness::started(gateway);

    harness.press(KeyCode::Enter);
    harness.type_text("msg");
    harness.press(KeyCode::Enter);
    harness.press(KeyCode::Enter);

    assert_eq!(harness.explorer.modal().state(), ModalState::Push);
    assert_eq!(harness.explorer.modal().error(), Some("git push: no upstream"));

    let retry = harness.key(KeyCode::Enter);
    assert!(matches!(retry[..], [Command::Push { .. }]));
}

#[test]
fn cancelled_commit_result_does_not_reopen_modal() {
    let mut gateway = FakeGateway::with_files(&["a.txt"]);
    gateway.commit_error = Some("hook rejected".to_string());
    let mut harness = Harness::started(gateway);

    harness.press(KeyCode::Enter);
    harness.type_text("msg");
    let commit = harness.key(KeyCode::Enter);
    harness.press(KeyCode::Esc);
    assert_eq!(harness.explorer.modal().state(), ModalState::None);

    harness.run(commit);

    assert_eq!(harness.explorer.modal().state(), ModalState::None);
    assert_eq!(
        harness.explorer.last_error().map(|error| error.message.as_str()),
        Some("git commit: hook rejected")
    );
}

#[test]
fn help_modal_opens_and_closes() {
    let mut harness = Harness::started(FakeGateway::with_files(&["a.txt"]));

    harness.press(KeyCode::Char('h'));
    assert_eq!(harness.explorer.modal().state(), ModalState::Help);
    assert!(harness.screen().iter().any(|line| line.contains("toggle explorer/diff")));

    harness.press(KeyCode::Esc);
    assert_eq!(harness.explorer.modal().state(), ModalState::None);
}

#[test]
fn quit_keys_end_the_program() {
    let mut explorer = Explorer::new(ExplorerConfig::default());
    assert_eq!(explorer.update(Msg::Key(Key::new(KeyCode::Char('q')))), Step::Quit);
    assert_eq!(explorer.update(Msg::Key(Key::new(KeyCode::Esc))), Step::Quit);

    explorer.update(Msg::Key(Key::new(KeyCode::Enter)));
    assert_eq!(
        explorer.update(Msg::Key(Key::ctrl(KeyCode::Char('c')))),
        Step::Quit
    );
}

#[test]
fn directories_expand_and_collapse_from_the_keyboard() {
    let gateway = FakeGateway::with_files(&["docs/a.txt", "docs/sub/b.txt", "root.txt"])
        .content("docs/a.txt", "alpha");
    let mut harness = Harness::started(gateway);

    assert_eq!(harness.row_paths(), vec!["docs", "root.txt"]);
    assert!(harness.explorer.content_lines().is_empty());
    assert!(
        harness
            .screen()
            .iter()
            .any(|line| line.contains("Select a file to view its contents."))
    );

    harness.press(KeyCode::Right);
    assert_eq!(
        harness.row_paths(),
        vec!["docs", "docs/a.txt", "docs/sub", "root.txt"]
    );

    harness.press(KeyCode::Down);
    assert_eq!(harness.explorer.content_lines(), ["alpha"]);

    harness.press(KeyCode::Left);
    assert_eq!(harness.row_paths(), vec!["docs", "root.txt"]);
    assert_eq!(harness.explorer.selected_path(), Some("docs"));
    assert!(harness.explorer.content_lines().is_empty());

    harness.press(KeyCode::Char(' '));
    assert_eq!(harness.row_paths().len(), 4);
}

#[test]
fn moving_onto_a_directory_clears_the_previous_file_error() {
    let mut harness = Harness::started(FakeGateway::with_files(&["gone.txt", "src/x.rs"]));
    assert_eq!(
        harness.explorer.last_error().map(|error| error.kind),
        Some(ErrorKind::NotFound)
    );

    harness.press(KeyCode::Down);

    assert_eq!(harness.explorer.selected_path(), Some("src"));
    assert!(harness.explorer.last_error().is_none());
    let screen = harness.screen().join("\n");
    assert!(!screen.contains("Error:"));
    assert!(screen.contains("Select a file to view its contents."));
}

#[test]
fn file_and_directory_sharing_a_path_are_both_selectable() {
    let mut gateway = FakeGateway::with_files(&["a/b"]).content("a", "old a");
    gateway.files.insert(0, FileStatusEntry::new("a", "D"));
    let mut harness = Harness::started(gateway);

    assert_eq!(harness.row_paths(), vec!["a", "a"]);
    assert_eq!(harness.explorer.content_lines(), ["old a"]);

    harness.press(KeyCode::Down);
    harness.press(KeyCode::Right);

    assert_eq!(harness.row_paths(), vec!["a", "a", "a/b"]);
    assert_eq!(harness.explorer.selected(), 1);
    assert!(harness.explorer.selected_row().is_some_and(|row| row.is_dir));

    harness.press(KeyCode::Char('r'));
    assert_eq!(harness.explorer.selected(), 1);
}

#[test]
fn collapse_state_survives_refresh() {
    let gateway = FakeGateway::with_files(&["docs/a.txt", "root.txt"]);
    let mut harness = Harness::started(gateway);
    harness.press(KeyCode::Right);

    harness.press(KeyCode::Char('r'));

    assert_eq!(harness.row_paths(), vec!["docs", "docs/a.txt", "root.txt"]);
}

#[test]
fn ignored_toggle_requests_ignored_files() {
    let mut gateway = FakeGateway::with_files(&["a.txt"]);
    gateway.files.push(FileStatusEntry::new("build.log", "!!"));
    let mut harness = Harness::started(gateway);
    assert_eq!(harness.row_paths(), vec!["a.txt"]);

    harness.press(KeyCode::Char('i'));

    assert!(harness.explorer.show_ignored);
    assert!(harness.gateway.called("list_files(true)"));
    assert_eq!(harness.row_paths(), vec!["a.txt", "build.log"]);
    assert!(harness.explorer.rows()[1].ignored);
}

#[test]
fn resize_rewraps_explorer_content() {
    let line = "x".repeat(100);
    let gateway = FakeGateway::with_files(&["wide.txt"]).content("wide.txt", &line);
    let mut harness = Harness::started(gateway);
    assert_eq!(harness.explorer.content_lines().len(), 2);

    harness.send(Msg::Resized(Size::new(200, 20)));
    assert_eq!(harness.explorer.content_lines().len(), 1);
}

#[test]
fn status_bar_shows_mode_and_summary() {
    let harness = Harness::started(FakeGateway::with_files(&["a.txt"]).content("a.txt", "a"));
    let screen = harness.screen();

    assert_eq!(
        screen.last().map(|line| line.trim()),
        Some("Mode: Explorer  |  git: main clean  |  h for help")
    );
    assert!(screen.iter().any(|line| line.contains("Files")));
}

#[test]
fn empty_diff_mode_shows_no_changes() {
    let mut harness = Harness::started(FakeGateway::with_files(&["a.txt"]));
    harness.press(KeyCode::Char('m'));

    let screen = harness.screen().join("\n");
    assert!(screen.contains("No changes detected."));
    assert!(screen.contains("Select a file to view its diff."));
}

#[test]
fn file_contents_from_git_drop_one_trailing_newline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let status = std::process::Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(dir.path())
        .status()
        .expect("git should be installed");
    assert!(status.success());
    std::fs::write(dir.path().join("file.txt"), "hello\nworld\n").expect("write");

    let harness = Harness::started(GitGateway::new(dir.path()));

    assert_eq!(harness.explorer.selected_path(), Some("file.txt"));
    assert_eq!(harness.explorer.raw_content, "hello\nworld");
    assert_eq!(harness.explorer.content_lines(), ["hello", "world"]);
}
