#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

use super::SessionStatus;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// What the HTTP layer can report back about a single call.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The connection could not be established, so nothing reached the server.
    #[error("backend is unreachable: {0}")]
    Unreachable(String),

    /// The request was sent but failed before a response was read.
    #[error("request to the backend failed: {0}")]
    Transport(String),

    #[error("backend did not respond in time")]
    Timeout,

    #[error("request was cancelled")]
    Cancelled,

    /// The server answered with a non-success status.
    #[error("backend rejected the request ({status})")]
    Api { status: u16, detail: Option<String> },

    /// The server answered with a success status but an unreadable body.
    #[error("unexpected response from the backend: {0}")]
    Decode(String),

    /// A selected document could not be read, so nothing was sent.
    #[error("could not read {name}: {message}")]
    File { name: String, message: String },
}

impl BackendError {
    /// Text worth showing the user verbatim instead of a generic failure.
    pub fn detail(&self) -> Option<String> {
        match self {
            BackendError::Api {
                detail: Some(detail),
                ..
            } => return Some(detail.to_string()),
            BackendError::File { .. } => return Some(self.to_string()),
            _ => return None,
        }
    }

    /// Whether the server may have applied the call's effect despite the failure.
    pub fn may_have_applied(&self) -> bool {
        match self {
            BackendError::Unreachable(_) | BackendError::File { .. } => return false,
            BackendError::Api { status, .. } => return *status >= 500,
            BackendError::Transport(_)
            | BackendError::Timeout
            | BackendError::Cancelled
            | BackendError::Decode(_) => return true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Operation {
    CreateSession,
    Upload,
    RefreshFiles,
    Ask,
    ClearSession,
}

impl Operation {
    pub fn generic_failure(&self) -> &'static str {
        match self {
            Operation::CreateSession => return "Error creating session.",
            Operation::Upload => return "Error uploading file.",
            Operation::RefreshFiles => return "Error fetching session files.",
            Operation::Ask => return "Error connecting to backend.",
            Operation::ClearSession => return "Error clearing session.",
        }
    }

    fn mutates_server(&self) -> bool {
        return matches!(self, Operation::Upload | Operation::ClearSession);
    }
}

/// The shape local state is left in after a failed operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FailureState {
    /// Rejected locally. No network call was made.
    PreconditionRejected,
    /// The call failed and local state is exactly as it was before it.
    RolledBack,
    /// Local state is unchanged, but the server may have applied the effect.
    Ambiguous,
}

fn backend_message(operation: &Operation, source: &BackendError) -> String {
    if let Some(detail) = source.detail() {
        return detail;
    }

    return operation.generic_failure().to_string();
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Session not initialized yet.")]
    NotInitialized,

    #[error("Session is already {0}.")]
    AlreadyInitialized(SessionStatus),

    #[error("Session could not be created. Restart UploadiT to try again.")]
    SessionUnavailable,

    #[error("Please select a file first!")]
    EmptySelection,

    #[error("You can upload at most {max} files per session. {uploaded} already uploaded, {selected} selected.")]
    QuotaExceeded {
        uploaded: usize,
        selected: usize,
        max: usize,
    },

    #[error("An upload is already in progress.")]
    UploadInProgress,

    #[error("A question is already being answered.")]
    AskInProgress,

    #[error("The session is already being cleared.")]
    ClearInProgress,

    /// A result for a session that was cleared while the call was in flight.
    #[error("The session was cleared before this finished, so the result was discarded.")]
    SessionChanged,

    #[error("{}", backend_message(.operation, .source))]
    Backend {
        operation: Operation,
        source: BackendError,
    },
}

impl OrchestratorError {
    pub fn backend(operation: Operation, source: BackendError) -> OrchestratorError {
        return OrchestratorError::Backend { operation, source };
    }

    pub fn end_state(&self) -> FailureState {
        if let OrchestratorError::Backend { operation, source } = self {
            if operation.mutates_server() && source.may_have_applied() {
                return FailureState::Ambiguous;
            }
            return FailureState::RolledBack;
        }

        if let OrchestratorError::SessionChanged = self {
            return FailureState::RolledBack;
        }

        return FailureState::PreconditionRejected;
    }
}
