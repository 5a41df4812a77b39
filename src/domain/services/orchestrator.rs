#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;

use super::ConversationDriver;
use super::RefreshOutcome;
use super::SessionManager;
use super::SessionReset;
use super::UploadCoordinator;
use super::UploadOutcome;
use crate::domain::models::with_cancel;
use crate::domain::models::AskRequest;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendResult;
use crate::domain::models::ChatTurn;
use crate::domain::models::ClearRequest;
use crate::domain::models::FileHandle;
use crate::domain::models::OrchestratorError;
use crate::domain::models::RefreshRequest;
use crate::domain::models::SessionId;
use crate::domain::models::UploadReceipt;
use crate::domain::models::UploadRequest;

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// The explicit session context: every piece of client state for one session,
/// threaded by reference to whoever drives it.
///
/// Each operation is available in two halves. `begin_*` checks preconditions,
/// flips the busy flag and returns an owned request; `finish_*` applies the
/// backend's answer. The async methods run both halves around a backend call.
#[derive(Default)]
pub struct Orchestrator {
    session: SessionManager,
    uploads: UploadCoordinator,
    conversation: ConversationDriver,
    reset: SessionReset,
}

impl Orchestrator {
    pub fn session(&self) -> &SessionManager {
        return &self.session;
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        return &self.uploads;
    }

    pub fn conversation(&self) -> &ConversationDriver {
        return &self.conversation;
    }

    pub fn is_clearing(&self) -> bool {
        return self.reset.is_clearing();
    }

    pub fn select_files(&mut self, handles: Vec<FileHandle>) {
        self.uploads.select_files(handles);
    }

    pub fn set_input(&mut self, text: &str) {
        self.conversation.set_input(text);
    }

    pub fn cancel_ask(&self) -> bool {
        return self.conversation.cancel_ask();
    }

    pub fn cancel_upload(&self) -> bool {
        return self.uploads.cancel_upload();
    }

    pub fn begin_initialize(&mut self) -> OrchestratorResult<()> {
        return self.session.begin_initialize();
    }

    pub fn finish_initialize(&mut self, res: BackendResult<SessionId>) -> OrchestratorResult<SessionId> {
        return self.session.finish_initialize(res);
    }

    /// Nothing new may start against a session that is being deleted.
    fn ensure_not_clearing(&self) -> OrchestratorResult<()> {
        if self.reset.is_clearing() {
            return Err(OrchestratorError::ClearInProgress);
        }

        return Ok(());
    }

    /// A result that belongs to a session other than the active one.
    fn is_stale(&self, session_id: &SessionId) -> bool {
        match self.session.session_id() {
            Ok(current) => return current != session_id,
            Err(_) => return true,
        }
    }

    pub fn begin_upload(&mut self) -> OrchestratorResult<UploadRequest> {
        self.ensure_not_clearing()?;
        return self.uploads.begin_upload(&self.session);
    }

    pub fn finish_upload(
        &mut self,
        request: &UploadRequest,
        res: BackendResult<UploadReceipt>,
    ) -> OrchestratorResult<UploadOutcome> {
        if self.is_stale(&request.session_id) {
            tracing::warn!(session_id = %request.session_id, "Discarding upload result for a cleared session");
            return Err(OrchestratorError::SessionChanged);
        }

        return self.uploads.finish_upload(request, res);
    }

    pub fn begin_refresh(&mut self) -> OrchestratorResult<RefreshRequest> {
        self.ensure_not_clearing()?;
        return self.uploads.begin_refresh(&self.session);
    }

    pub fn finish_refresh(
        &mut self,
        request: &RefreshRequest,
        res: BackendResult<Vec<String>>,
    ) -> OrchestratorResult<RefreshOutcome> {
        return self.uploads.finish_refresh(request, res);
    }

    pub fn begin_ask(&mut self) -> OrchestratorResult<Option<AskRequest>> {
        if self.conversation.input().trim().is_empty() {
            return Ok(None);
        }

        self.ensure_not_clearing()?;
        return self.conversation.begin_ask(&self.session);
    }

    pub fn finish_ask(
        &mut self,
        request: &AskRequest,
        res: BackendResult<String>,
    ) -> OrchestratorResult<ChatTurn> {
        if self.is_stale(&request.session_id) {
            tracing::warn!(session_id = %request.session_id, "Discarding answer for a cleared session");
            return Err(OrchestratorError::SessionChanged);
        }

        return self.conversation.finish_ask(request, res);
    }

    pub fn begin_clear(&mut self) -> OrchestratorResult<ClearRequest> {
        return self
            .reset
            .begin_clear(&self.session, &self.uploads, &self.conversation);
    }

    pub fn finish_clear(
        &mut self,
        request: &ClearRequest,
        res: BackendResult<()>,
    ) -> OrchestratorResult<()> {
        return self.reset.finish_clear(
            request,
            res,
            &mut self.session,
            &mut self.uploads,
            &mut self.conversation,
        );
    }

    /// First step of activation. Call `refresh_files` once it resolves so the
    /// inventory reflects the new session.
    pub async fn initialize(&mut self, backend: &BackendBox) -> OrchestratorResult<SessionId> {
        return self.session.initialize(backend).await;
    }

    pub async fn refresh_files(&mut self, backend: &BackendBox) -> OrchestratorResult<RefreshOutcome> {
        self.ensure_not_clearing()?;
        return self.uploads.refresh_files(&self.session, backend).await;
    }

    pub async fn submit_upload(&mut self, backend: &BackendBox) -> OrchestratorResult<UploadOutcome> {
        self.ensure_not_clearing()?;
        return self.uploads.submit_upload(&self.session, backend).await;
    }

    /// Asks `question`. An empty question is a no-op and resolves to `None`.
    pub async fn ask(
        &mut self,
        backend: &BackendBox,
        question: &str,
    ) -> OrchestratorResult<Option<ChatTurn>> {
        if question.trim().is_empty() {
            return Ok(None);
        }

        self.ensure_not_clearing()?;
        self.conversation.set_input(question);
        return self.conversation.ask(&self.session, backend).await;
    }

    pub async fn clear_session(&mut self, backend: &BackendBox) -> OrchestratorResult<()> {
        let request = self.begin_clear()?;
        let res = with_cancel(&request.cancel, backend.clear_session(&request.session_id)).await;

        return self.finish_clear(&request, res);
    }
}
