use std::io;

use termwiz::Error as TermwizError;

/// Failures of the terminal runtime. Only these can end the process.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("terminal error: {0}")]
    Terminal(TermwizError),
}

impl From<TermwizError> for ProgramError {
    fn from(error: TermwizError) -> Self {
        ProgramError::Terminal(error)
    }
}

/// Input rejected before it reaches the gateway.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Commit message is required.")]
    EmptyCommitMessage,
}

/// Any failing version-control query or mutation.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("git {args}: {detail}")]
    Git { args: String, detail: String },

    #[error("failed to run git: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },

    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotFound { .. } => ErrorKind::NotFound,
            GatewayError::Validation(_) => ErrorKind::Validation,
            GatewayError::Git { .. } | GatewayError::Spawn { .. } | GatewayError::Read { .. } => {
                ErrorKind::Gateway
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Gateway,
    NotFound,
    Validation,
}

/// Displayable snapshot of an error kept in the explorer state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&GatewayError> for ErrorInfo {
    fn from(error: &GatewayError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
