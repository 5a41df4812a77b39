use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::with_cancel;
use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::MAX_FILES;

pub fn help_text() -> String {
    let text = format!(
        r#"
COMMANDS:
- /select (/s) PATH... - Chooses documents to upload next, replacing any earlier selection. Accepts .pdf, .txt and .docx files.
- /upload (/u) [PATH...] - Uploads the selected documents. Paths passed here are selected first.
- /files (/f) - Fetches the list of documents the session holds.
- /clear (/c) - Deletes the session with its documents and conversation, then starts a fresh one.
- /quit /exit (/q) - Exit UploadiT.
- /help (/h) - Provides this help menu.

A session holds at most {MAX_FILES} documents. Anything else you type is asked as a question against all of them.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+C - Cancel the question being answered or the upload in progress, otherwise exit.
        "#
    );

    return text.trim().to_string();
}

/// Runs one backend call per action on its own task and reports the result back to
/// the UI as an event. The UI is the only place state is mutated.
pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        backend: BackendBox,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let backend = Arc::new(backend);

        loop {
            let action = match rx.recv().await {
                Some(action) => action,
                None => return Ok(()),
            };

            let worker_tx = tx.clone();
            let backend = Arc::clone(&backend);

            tokio::spawn(async move {
                let event = match action {
                    Action::CreateSession() => {
                        Event::SessionCreated(backend.create_session().await)
                    }
                    Action::RefreshFiles(request) => {
                        let res =
                            with_cancel(&request.cancel, backend.list_files(&request.session_id))
                                .await;
                        Event::FilesRefreshed(request, res)
                    }
                    Action::Upload(request) => {
                        let res = with_cancel(
                            &request.cancel,
                            backend.upload(&request.session_id, &request.files),
                        )
                        .await;
                        Event::UploadFinished(request, res)
                    }
                    Action::Ask(request) => {
                        let res = with_cancel(
                            &request.cancel,
                            backend.ask(&request.session_id, &request.question),
                        )
                        .await;
                        Event::AskFinished(request, res)
                    }
                    Action::ClearSession(request) => {
                        let res = with_cancel(
                            &request.cancel,
                            backend.clear_session(&request.session_id),
                        )
                        .await;
                        Event::SessionCleared(request, res)
                    }
                };

                if worker_tx.send(event).is_err() {
                    tracing::warn!("UI closed before a backend result could be delivered");
                }
            });
        }
    }
}
