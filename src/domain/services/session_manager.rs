#[cfg(test)]
#[path = "session_manager_test.rs"]
mod tests;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendResult;
use crate::domain::models::Operation;
use crate::domain::models::OrchestratorError;
use crate::domain::models::SessionId;
use crate::domain::models::SessionStatus;

/// Owns the session identifier. Every other component reads it from here and
/// nowhere else.
pub struct SessionManager {
    status: SessionStatus,
    id: Option<SessionId>,
}

impl Default for SessionManager {
    fn default() -> SessionManager {
        return SessionManager {
            status: SessionStatus::Uninitialized,
            id: None,
        };
    }
}

impl SessionManager {
    pub fn status(&self) -> SessionStatus {
        return self.status;
    }

    /// The active session id, or `NotInitialized` while there is none.
    pub fn session_id(&self) -> Result<&SessionId, OrchestratorError> {
        if self.status != SessionStatus::Active {
            return Err(OrchestratorError::NotInitialized);
        }

        return self.id.as_ref().ok_or(OrchestratorError::NotInitialized);
    }

    pub fn begin_initialize(&mut self) -> Result<(), OrchestratorError> {
        match self.status {
            SessionStatus::Uninitialized | SessionStatus::Cleared => {
                self.status = SessionStatus::Initializing;
                return Ok(());
            }
            SessionStatus::Failed => {
                return Err(OrchestratorError::SessionUnavailable);
            }
            status => {
                return Err(OrchestratorError::AlreadyInitialized(status));
            }
        }
    }

    pub fn finish_initialize(
        &mut self,
        res: BackendResult<SessionId>,
    ) -> Result<SessionId, OrchestratorError> {
        if self.status != SessionStatus::Initializing {
            tracing::warn!(status = %self.status, "Ignoring session creation result");
            return Err(OrchestratorError::AlreadyInitialized(self.status));
        }

        match res {
            Ok(session_id) => {
                tracing::info!(session_id = %session_id, "Session created");
                self.status = SessionStatus::Active;
                self.id = Some(session_id.clone());
                return Ok(session_id);
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to create session");
                self.status = SessionStatus::Failed;
                self.id = None;
                return Err(OrchestratorError::backend(Operation::CreateSession, err));
            }
        }
    }

    /// Requests a session from the backend. Only one may be created per
    /// activation, and a new one only after the previous one was cleared.
    pub async fn initialize(&mut self, backend: &BackendBox) -> Result<SessionId, OrchestratorError> {
        self.begin_initialize()?;
        let res = backend.create_session().await;
        return self.finish_initialize(res);
    }

    pub(super) fn invalidate(&mut self) {
        if let Some(session_id) = self.id.take() {
            tracing::info!(session_id = %session_id, "Session invalidated");
        }
        self.status = SessionStatus::Cleared;
    }
}
