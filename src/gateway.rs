use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{GatewayError, ValidationError};

pub const UNTRACKED: &str = "??";
pub const IGNORED: &str = "!!";

/// One path reported by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileStatusEntry {
    /// Repository-relative, `/`-separated.
    pub path: String,
    /// Short-format status with surrounding blanks removed; empty for clean
    /// tracked files.
    pub status: String,
    pub ignored: bool,
}

impl FileStatusEntry {
    pub fn new(path: impl Into<String>, status: impl Into<String>) -> Self {
        let status = status.into();
        Self {
            path: path.into(),
            ignored: status == IGNORED,
            status,
        }
    }

    pub fn clean(path: impl Into<String>) -> Self {
        Self::new(path, "")
    }

    pub fn is_untracked(&self) -> bool {
        self.status.starts_with(UNTRACKED)
    }
}

/// Version-control queries and mutations consumed by the command dispatcher.
///
/// Implementations are called from worker threads, never from the update loop.
pub trait StatusGateway: Send + Sync {
    /// Tracked plus untracked paths, sorted and deduplicated. Ignored paths
    /// are only included (as `!!`) when asked for.
    fn list_files(&self, include_ignored: bool) -> Result<Vec<FileStatusEntry>, GatewayError>;

    /// Only paths with pending changes, untracked directories expanded.
    fn status(&self) -> Result<Vec<FileStatusEntry>, GatewayError>;

    /// Unified diff for `path`; untracked files are diffed against nothing.
    fn diff(&self, path: &str, status: &str) -> Result<String, GatewayError>;

    fn file_contents(&self, path: &str) -> Result<String, GatewayError>;

    /// Stages everything, then commits.
    fn commit(&self, message: &str) -> Result<(), GatewayError>;

    fn push(&self) -> Result<(), GatewayError>;

    fn branch_name(&self) -> Result<String, GatewayError>;
}

/// [`StatusGateway`] backed by the `git` command line.
#[derive(Clone, Debug)]
pub struct GitGateway {
    repo: PathBuf,
}

impl GitGateway {
    pub fn new(repo: impl AsRef<Path>) -> Self {
        let repo = repo.as_ref();
        let repo = std::path::absolute(repo).unwrap_or_else(|_| repo.to_path_buf());
        Self { repo }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn run_git<I, S>(&self, args: I) -> Result<String, GatewayError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();
        let label = args
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!("git {label}");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(&args)
            .env("GIT_PAGER", "cat")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GatewayError::Spawn { source })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        // `git diff --no-index` exits with 1 when the inputs differ.
        if output.status.code() == Some(1) && !stdout.is_empty() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(GatewayError::Git {
            args: label,
            detail: format!("{}: {}", output.status, stderr.trim()),
        })
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.repo.join(path)
    }
}

impl StatusGateway for GitGateway {
    fn list_files(&self, include_ignored: bool) -> Result<Vec<FileStatusEntry>, GatewayError> {
        let tracked = self.run_git(["ls-files", "-z"])?;
        let untracked = self.run_git(["ls-files", "--others", "--exclude-standard", "-z"])?;
        let ignored = if include_ignored {
            self.run_git([
                "ls-files",
                "--others",
                "--ignored",
                "--exclude-standard",
                "-z",
            ])?
        } else {
            String::new()
        };

        let mut entries: BTreeMap<String, FileStatusEntry> = BTreeMap::new();
        let sources = [(&tracked, ""), (&untracked, UNTRACKED), (&ignored, IGNORED)];
        for (output, status) in sources {
            for path in split_null_paths(output) {
                entries
                    .entry(path.to_string())
                    .or_insert_with(|| FileStatusEntry::new(path, status));
            }
        }

        Ok(entries.into_values().collect())
    }

    fn status(&self) -> Result<Vec<FileStatusEntry>, GatewayError> {
        let output = self.run_git(["status", "--porcelain", "-z", "--untracked-files=all"])?;
        Ok(parse_porcelain(&output))
    }

    fn diff(&self, path: &str, status: &str) -> Result<String, GatewayError> {
        if path.is_empty() {
            return Ok(String::new());
        }

        if status.starts_with(UNTRACKED) {
            let target = self.absolute(path);
            if !target.exists() {
                return Err(GatewayError::NotFound {
                    path: path.to_string(),
                });
            }
            let output = self.run_git([
                OsStr::new("diff"),
                OsStr::new("--no-color"),
                OsStr::new("--no-index"),
                OsStr::new("--"),
                OsStr::new("/dev/null"),
                target.as_os_str(),
            ])?;
            return Ok(trim_trailing_newline(output));
        }

        let output = self.run_git(["diff", "--no-color", "--", path])?;
        if !output.trim().is_empty() || status.is_empty() {
            return Ok(trim_trailing_newline(output));
        }

        // Nothing left in the working tree; the change may be staged only.
        let staged = self.run_git(["diff", "--no-color", "--cached", "--", path])?;
        Ok(trim_trailing_newline(staged))
    }

    fn file_contents(&self, path: &str) -> Result<String, GatewayError> {
        if path.is_empty() {
            return Ok(String::new());
        }

        let target = self.absolute(path);
        match fs::read(&target) {
            Ok(bytes) => Ok(trim_trailing_newline(
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(source) if source.kind() == ErrorKind::NotFound => Err(GatewayError::NotFound {
                path: path.to_string(),
            }),
            Err(source) => Err(GatewayError::Read {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn commit(&self, message: &str) -> Result<(), GatewayError> {
        if message.trim().is_empty() {
            return Err(ValidationError::EmptyCommitMessage.into());
        }
        self.run_git(["add", "-A"])?;
        self.run_git(["commit", "-m", message])?;
        Ok(())
    }

    fn push(&self) -> Result<(), GatewayError> {
        self.run_git(["push"]).map(|_| ())
    }

    fn branch_name(&self) -> Result<String, GatewayError> {
        let output = self.run_git(["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(output.trim().to_string())
    }
}

/// Replace the status of every entry that also appears in `statuses`.
pub fn annotate(files: Vec<FileStatusEntry>, statuses: &[FileStatusEntry]) -> Vec<FileStatusEntry> {
    if statuses.is_empty() {
        return files;
    }

    let by_path: HashMap<&str, &str> = statuses
        .iter()
        .filter(|entry| !entry.path.is_empty())
        .map(|entry| (entry.path.as_str(), entry.status.as_str()))
        .collect();

    files
        .into_iter()
        .map(|mut entry| {
            if let Some(status) = by_path.get(entry.path.as_str()) {
                entry.status = (*status).to_string();
                entry.ignored = false;
            }
            entry
        })
        .collect()
}

/// Parse `git status --porcelain -z` output. Renames and copies keep only
/// the destination path.
pub fn parse_porcelain(output: &str) -> Vec<FileStatusEntry> {
    let mut entries = BTreeMap::new();
    let mut fields = output.split('\0');

    while let Some(field) = fields.next() {
        if field.len() < 4 {
            continue;
        }
        let Some((code, path)) = field.split_at_checked(3) else {
            continue;
        };
        let code = code[..2].trim();
        if code.contains(['R', 'C']) {
            // The source path follows as its own field.
            fields.next();
        }
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            continue;
        }
        entries.insert(path.to_string(), FileStatusEntry::new(path, code));
    }

    entries.into_values().collect()
}

fn split_null_paths(output: &str) -> impl Iterator<Item = &str> {
    output
        .trim_end_matches('\0')
        .split('\0')
        .filter(|path| !path.is_empty())
}

/// Drop exactly one trailing newline.
pub fn trim_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
    }
    text
}
