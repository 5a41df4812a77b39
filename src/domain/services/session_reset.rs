#[cfg(test)]
#[path = "session_reset_test.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use super::ConversationDriver;
use super::SessionManager;
use super::UploadCoordinator;
use crate::domain::models::BackendResult;
use crate::domain::models::ClearRequest;
use crate::domain::models::Operation;
use crate::domain::models::OrchestratorError;

/// Invalidates the server-side session, then clears chat, inventory and selection
/// in one step. Nothing can observe a partially cleared state.
#[derive(Default)]
pub struct SessionReset {
    clearing: Option<CancellationToken>,
}

impl SessionReset {
    pub fn is_clearing(&self) -> bool {
        return self.clearing.is_some();
    }

    /// Clearing waits for any upload or question to settle first, so neither can
    /// land in a session that no longer exists.
    pub fn begin_clear(
        &mut self,
        session: &SessionManager,
        uploads: &UploadCoordinator,
        conversation: &ConversationDriver,
    ) -> Result<ClearRequest, OrchestratorError> {
        if self.clearing.is_some() {
            return Err(OrchestratorError::ClearInProgress);
        }

        let session_id = session.session_id()?.clone();

        if uploads.is_uploading() {
            return Err(OrchestratorError::UploadInProgress);
        }
        if conversation.is_loading() {
            return Err(OrchestratorError::AskInProgress);
        }

        let cancel = CancellationToken::new();
        self.clearing = Some(cancel.clone());

        return Ok(ClearRequest { session_id, cancel });
    }

    pub fn finish_clear(
        &mut self,
        request: &ClearRequest,
        res: BackendResult<()>,
        session: &mut SessionManager,
        uploads: &mut UploadCoordinator,
        conversation: &mut ConversationDriver,
    ) -> Result<(), OrchestratorError> {
        self.clearing = None;

        if let Err(err) = res {
            tracing::error!(
                session_id = %request.session_id,
                error = ?err,
                "Failed to clear session"
            );
            return Err(OrchestratorError::backend(Operation::ClearSession, err));
        }

        conversation.clear_local();
        uploads.clear_local();
        session.invalidate();

        return Ok(());
    }
}
