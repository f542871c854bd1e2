//! Commit, push, and help overlays.

use crate::error::ValidationError;
use crate::event::{Key, KeyCode};
use crate::input::{InputState, InputView};

pub const COMMIT_MESSAGE_LIMIT: usize = 120;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModalState {
    #[default]
    None,
    Commit,
    Push,
    Help,
}

/// What the owner has to do after a key reached the modal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalOutcome {
    Stay,
    Closed,
    Commit { ticket: u64, message: String },
    Push { ticket: u64 },
}

/// Sub-state machine for the overlays.
///
/// Every open and every close bumps `ticket`. Commit and push requests carry
/// the ticket they were issued under, so a result that arrives after the user
/// cancelled is recognised and left out of the modal.
#[derive(Debug)]
pub struct ModalController {
    state: ModalState,
    input: InputState,
    error: Option<String>,
    ticket: u64,
    pending: bool,
}

impl Default for ModalController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalController {
    pub fn new() -> Self {
        Self {
            state: ModalState::None,
            input: InputState::new()
                .with_char_limit(COMMIT_MESSAGE_LIMIT)
                .with_placeholder("Describe your change"),
            error: None,
            ticket: 0,
            pending: false,
        }
    }

    pub fn state(&self) -> ModalState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::None
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// A commit or push request is waiting for its result.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn message(&self) -> String {
        self.input.value()
    }

    pub fn input_view(&self, width: usize) -> InputView {
        self.input.view(width)
    }

    pub fn open_commit(&mut self) {
        self.input.clear();
        self.enter(ModalState::Commit);
    }

    pub fn open_help(&mut self) {
        self.enter(ModalState::Help);
    }

    pub fn close(&mut self) {
        self.enter(ModalState::None);
    }

    fn enter(&mut self, state: ModalState) {
        self.state = state;
        self.error = None;
        self.pending = false;
        self.ticket += 1;
    }

    pub fn handle_key(&mut self, key: Key) -> ModalOutcome {
        match self.state {
            ModalState::None => ModalOutcome::Stay,
            ModalState::Help => match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.close();
                    ModalOutcome::Closed
                }
                _ => ModalOutcome::Stay,
            },
            ModalState::Commit => match key.code {
                KeyCode::Esc => {
                    self.close();
                    ModalOutcome::Closed
                }
                KeyCode::Enter => self.confirm_commit(),
                _ => {
                    self.input.handle_key(key);
                    ModalOutcome::Stay
                }
            },
            ModalState::Push => match key.code {
                KeyCode::Esc => {
                    self.close();
                    ModalOutcome::Closed
                }
                KeyCode::Enter if !self.pending => {
                    self.pending = true;
                    self.error = None;
                    ModalOutcome::Push {
                        ticket: self.ticket,
                    }
                }
                _ => ModalOutcome::Stay,
            },
        }
    }

    fn confirm_commit(&mut self) -> ModalOutcome {
        if self.pending {
            return ModalOutcome::Stay;
        }

        let message = self.input.value().trim().to_string();
        if message.is_empty() {
            self.error = Some(ValidationError::EmptyCommitMessage.to_string());
            return ModalOutcome::Stay;
        }

        self.pending = true;
        self.error = None;
        ModalOutcome::Commit {
            ticket: self.ticket,
            message,
        }
    }

    fn is_current(&self, ticket: u64, state: ModalState) -> bool {
        self.ticket == ticket && self.state == state
    }

    /// Fold a commit result into the modal. Returns `false` when the request
    /// belongs to a modal that has since been closed.
    pub fn on_commit_result(&mut self, ticket: u64, error: Option<String>) -> bool {
        if !self.is_current(ticket, ModalState::Commit) {
            return false;
        }

        self.pending = false;
        match error {
            Some(error) => self.error = Some(error),
            None => {
                self.state = ModalState::Push;
                self.error = None;
            }
        }
        true
    }

    /// Fold a push result into the modal; success closes it. Returns `false`
    /// for stale results.
    pub fn on_push_result(&mut self, ticket: u64, error: Option<String>) -> bool {
        if !self.is_current(ticket, ModalState::Push) {
            return false;
        }

        match error {
            Some(error) => {
                self.pending = false;
                self.error = Some(error);
            }
            None => self.close(),
        }
        true
    }
}
