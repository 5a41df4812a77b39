#[cfg(test)]
#[path = "conversation_driver_test.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use super::SessionManager;
use crate::domain::models::with_cancel;
use crate::domain::models::AskRequest;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendResult;
use crate::domain::models::ChatTurn;
use crate::domain::models::Operation;
use crate::domain::models::OrchestratorError;

/// Owns the ordered turn history and the question being typed. One question is
/// in flight at a time; a second one is rejected rather than queued.
#[derive(Default)]
pub struct ConversationDriver {
    chat: Vec<ChatTurn>,
    input: String,
    asking: Option<CancellationToken>,
}

impl ConversationDriver {
    pub fn chat(&self) -> &[ChatTurn] {
        return &self.chat;
    }

    pub fn input(&self) -> &str {
        return &self.input;
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    pub fn is_loading(&self) -> bool {
        return self.asking.is_some();
    }

    /// Returns `None` when there is nothing to ask.
    pub fn begin_ask(
        &mut self,
        session: &SessionManager,
    ) -> Result<Option<AskRequest>, OrchestratorError> {
        if self.input.trim().is_empty() {
            return Ok(None);
        }

        if self.asking.is_some() {
            return Err(OrchestratorError::AskInProgress);
        }

        let session_id = session.session_id()?.clone();
        let cancel = CancellationToken::new();
        self.asking = Some(cancel.clone());

        tracing::debug!(session_id = %session_id, "Question sent");

        return Ok(Some(AskRequest {
            session_id,
            question: self.input.to_string(),
            cancel,
        }));
    }

    pub fn finish_ask(
        &mut self,
        request: &AskRequest,
        res: BackendResult<String>,
    ) -> Result<ChatTurn, OrchestratorError> {
        self.asking = None;

        let answer = match res {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!(error = ?err, "Question failed");
                return Err(OrchestratorError::backend(Operation::Ask, err));
            }
        };

        let turn = ChatTurn::new(&request.question, &answer);
        self.chat.push(turn.clone());

        if self.input == request.question {
            self.input.clear();
        }

        return Ok(turn);
    }

    pub fn cancel_ask(&self) -> bool {
        if let Some(cancel) = &self.asking {
            cancel.cancel();
            return true;
        }

        return false;
    }

    pub async fn ask(
        &mut self,
        session: &SessionManager,
        backend: &BackendBox,
    ) -> Result<Option<ChatTurn>, OrchestratorError> {
        let request = match self.begin_ask(session)? {
            Some(request) => request,
            None => return Ok(None),
        };

        let res = with_cancel(
            &request.cancel,
            backend.ask(&request.session_id, &request.question),
        )
        .await;

        return self.finish_ask(&request, res).map(Some);
    }

    pub(super) fn clear_local(&mut self) {
        if let Some(cancel) = self.asking.take() {
            cancel.cancel();
        }
        self.chat.clear();
    }
}
