//! One-shot effects issued by the explorer and the executor that runs them.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ErrorInfo, GatewayError};
use crate::explorer::{Mode, Msg};
use crate::gateway::{FileStatusEntry, StatusGateway, annotate};
use crate::program::TaskFn;

/// Parameters of a refresh, captured when it is issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshRequest {
    pub generation: u64,
    pub mode: Mode,
    /// Path selected when the refresh was issued.
    pub keep_path: Option<String>,
    pub include_ignored: bool,
}

/// Parameters of a content fetch, captured when it is issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRequest {
    pub generation: u64,
    pub path: String,
    pub status: String,
    pub mode: Mode,
    /// Keep the current scroll offset when the result lands.
    pub preserve_scroll: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Refresh(RefreshRequest),
    FetchContent(ContentRequest),
    Commit { ticket: u64, message: String },
    Push { ticket: u64 },
    ScheduleTick { after: Duration },
}

/// Result of a refresh: the file list for the active mode plus what the
/// status bar needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub files: Vec<FileStatusEntry>,
    /// Pending changes used for the summary.
    pub statuses: Vec<FileStatusEntry>,
    pub branch: Option<String>,
}

/// Run `command` against `gateway` on the current thread.
pub fn execute(gateway: &dyn StatusGateway, command: Command) -> Msg {
    match command {
        Command::Refresh(request) => {
            let result = load_snapshot(gateway, &request).map_err(|error| info_for(&error));
            Msg::Refreshed { request, result }
        }
        Command::FetchContent(request) => {
            let result = match request.mode {
                Mode::Explorer => gateway.file_contents(&request.path),
                Mode::Diff => gateway.diff(&request.path, &request.status),
            }
            .map_err(|error| info_for(&error));
            Msg::ContentLoaded { request, result }
        }
        Command::Commit { ticket, message } => {
            let result = gateway.commit(&message).map_err(|error| info_for(&error));
            Msg::Committed { ticket, result }
        }
        Command::Push { ticket } => {
            let result = gateway.push().map_err(|error| info_for(&error));
            Msg::Pushed { ticket, result }
        }
        Command::ScheduleTick { .. } => Msg::Tick,
    }
}

fn load_snapshot(
    gateway: &dyn StatusGateway,
    request: &RefreshRequest,
) -> Result<Snapshot, GatewayError> {
    let (files, statuses) = match request.mode {
        Mode::Explorer => {
            let files = gateway.list_files(request.include_ignored)?;
            let statuses = gateway.status().unwrap_or_else(|error| {
                warn!("status unavailable, listing without annotations: {error}");
                Vec::new()
            });
            (annotate(files, &statuses), statuses)
        }
        Mode::Diff => {
            let statuses = gateway.status()?;
            (statuses.clone(), statuses)
        }
    };

    let branch = gateway
        .branch_name()
        .ok()
        .filter(|branch| !branch.is_empty());

    Ok(Snapshot {
        files,
        statuses,
        branch,
    })
}

fn info_for(error: &GatewayError) -> ErrorInfo {
    warn!("gateway call failed: {error}");
    ErrorInfo::from(error)
}

/// Turns commands into tasks for the runtime.
#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn StatusGateway>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn StatusGateway>) -> Self {
        Self { gateway }
    }

    pub fn dispatch(&self, command: Command) -> TaskFn<Msg> {
        info!("dispatching {}", describe(&command));

        if let Command::ScheduleTick { after } = command {
            return Box::pin(async move {
                smol::Timer::after(after).await;
                Msg::Tick
            });
        }

        let gateway = Arc::clone(&self.gateway);
        Box::pin(async move { smol::unblock(move || execute(gateway.as_ref(), command)).await })
    }
}

fn describe(command: &Command) -> String {
    match command {
        Command::Refresh(request) => format!(
            "refresh #{} ({:?}, ignored: {})",
            request.generation, request.mode, request.include_ignored
        ),
        Command::FetchContent(request) => format!(
            "fetch #{} {} ({:?})",
            request.generation, request.path, request.mode
        ),
        Command::Commit { ticket, .. } => format!("commit (ticket {ticket})"),
        Command::Push { ticket } => format!("push (ticket {ticket})"),
        Command::ScheduleTick { after } => format!("tick in {after:?}"),
    }
}
