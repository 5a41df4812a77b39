#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::BubbleList;
use super::Orchestrator;
use super::RefreshOutcome;
use super::Scroll;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::AskRequest;
use crate::domain::models::Author;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendError;
use crate::domain::models::BackendResult;
use crate::domain::models::ClearRequest;
use crate::domain::models::FailureState;
use crate::domain::models::FileHandle;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::OrchestratorError;
use crate::domain::models::RefreshRequest;
use crate::domain::models::SessionId;
use crate::domain::models::SlashCommand;
use crate::domain::models::UploadReceipt;
use crate::domain::models::UploadRequest;
use crate::domain::models::MAX_FILES;

fn welcome_text() -> String {
    return format!("Hey there! Select up to {MAX_FILES} documents with /select, send them with /upload, then ask me anything about them. Type /help for everything else.");
}

fn file_names(files: &[FileHandle]) -> String {
    return files
        .iter()
        .map(|e| return e.name.to_string())
        .collect::<Vec<String>>()
        .join(", ");
}

pub struct AppState<'a> {
    pub bubble_list: BubbleList<'a>,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub messages: Vec<Message>,
    pub orchestrator: Orchestrator,
    pub scroll: Scroll,
}

impl<'a> AppState<'a> {
    pub async fn new(backend: &BackendBox) -> Result<AppState<'a>> {
        let mut app_state = AppState {
            bubble_list: BubbleList::default(),
            last_known_height: 0,
            last_known_width: 0,
            messages: vec![Message::new(Author::UploadiT, &welcome_text())],
            orchestrator: Orchestrator::default(),
            scroll: Scroll::default(),
        };

        if let Err(err) = backend.health_check().await {
            let url = Config::get(ConfigKey::BackendURL);
            app_state.add_error(&format!(
                "Hey, it looks like the backend at {url} isn't running, I can't connect to it. Uploads and questions will fail until it's reachable.\n\nError: {err}"
            ));
        }

        return Ok(app_state);
    }

    pub fn is_asking(&self) -> bool {
        return self.orchestrator.conversation().is_loading();
    }

    /// Requests a session. Called once at startup and again after a reset.
    pub fn start_session(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        match self.orchestrator.begin_initialize() {
            Ok(()) => tx.send(Action::CreateSession())?,
            Err(err) => self.add_error(&err.to_string()),
        }

        return Ok(());
    }

    pub fn handle_session_created(
        &mut self,
        res: BackendResult<SessionId>,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        match self.orchestrator.finish_initialize(res) {
            Ok(session_id) => {
                tracing::debug!(session_id = %session_id, "Session ready");
                self.refresh_files(tx)?;
            }
            Err(err @ OrchestratorError::Backend { .. }) => {
                self.add_error(&format!(
                    "{err} Nothing can be uploaded or asked until UploadiT is restarted."
                ));
            }
            Err(err) => {
                tracing::warn!(error = ?err, "Ignoring session creation result");
            }
        }

        return Ok(());
    }

    pub fn handle_files_refreshed(
        &mut self,
        request: &RefreshRequest,
        res: BackendResult<Vec<String>>,
    ) {
        match self.orchestrator.finish_refresh(request, res) {
            Ok(RefreshOutcome::Replaced) => {
                tracing::debug!(
                    files = self.orchestrator.uploads().uploaded_files().len(),
                    "Inventory refreshed"
                );
            }
            Ok(RefreshOutcome::Superseded) => (),
            Err(err) => self.add_error(&err.to_string()),
        }
    }

    pub fn handle_upload_finished(
        &mut self,
        request: &UploadRequest,
        res: BackendResult<UploadReceipt>,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        match self.orchestrator.finish_upload(request, res) {
            Ok(outcome) => {
                tracing::debug!(
                    accepted = outcome.accepted_files.len(),
                    needs_refresh = outcome.needs_refresh,
                    "Upload acknowledged"
                );
                let mut text = outcome.message;
                if text.is_empty() {
                    text = format!("Uploaded {}.", file_names(&request.files));
                }
                self.add_notice(&text);

                if outcome.needs_refresh {
                    self.refresh_files(tx)?;
                }
            }
            Err(OrchestratorError::SessionChanged) => (),
            Err(err) => {
                let mut text = err.to_string();
                if err.end_state() == FailureState::Ambiguous {
                    text = format!("{text}\n\nThe server may have received some of these documents anyway. Run /files to see what the session holds.");
                }
                self.add_error(&text);
            }
        }

        return Ok(());
    }

    /// Returns true when the input box should be emptied.
    pub fn handle_ask_finished(&mut self, request: &AskRequest, res: BackendResult<String>) -> bool {
        match self.orchestrator.finish_ask(request, res) {
            Ok(turn) => {
                tracing::debug!(
                    turns = self.orchestrator.conversation().chat().len(),
                    "Answer received"
                );
                for message in Message::from_turn(&turn) {
                    self.add_message(message);
                }
                return self.orchestrator.conversation().input().is_empty();
            }
            Err(OrchestratorError::Backend {
                source: BackendError::Cancelled,
                ..
            }) => {
                self.add_notice("Cancelled. Your question is still in the input box.");
            }
            Err(OrchestratorError::SessionChanged) => (),
            Err(err) => {
                self.add_error(&err.to_string());
            }
        }

        return false;
    }

    pub fn handle_session_cleared(
        &mut self,
        request: &ClearRequest,
        res: BackendResult<()>,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        match self.orchestrator.finish_clear(request, res) {
            Ok(()) => {
                self.messages.clear();
                self.add_notice("Session cleared. Starting a fresh one.");
                self.start_session(tx)?;
            }
            Err(err) => {
                let mut text = err.to_string();
                if err.end_state() == FailureState::Ambiguous {
                    text = format!("{text}\n\nThe server may have deleted the session anyway. Restart UploadiT if uploads or questions start failing.");
                }
                self.add_error(&text);
            }
        }

        return Ok(());
    }

    /// Sends `text` as a question. Empty input is ignored.
    pub fn submit_question(&mut self, text: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        self.orchestrator.set_input(text);

        match self.orchestrator.begin_ask() {
            Ok(Some(request)) => tx.send(Action::Ask(request))?,
            Ok(None) => (),
            Err(err) => self.add_error(&err.to_string()),
        }

        return Ok(());
    }

    /// Returns true when the app should exit.
    pub fn handle_slash_commands(
        &mut self,
        input_str: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<bool> {
        let command = match SlashCommand::parse(input_str) {
            Some(command) => command,
            None => return Ok(false),
        };

        if command.is_quit() {
            return Ok(true);
        }

        if command.is_help() {
            self.add_notice(&help_text());
        } else if command.is_select() {
            if command.args.is_empty() {
                self.add_error("Pass one or more paths to select, e.g. /select report.pdf notes.txt");
            } else if self.select_files(&command.args) {
                let uploads = self.orchestrator.uploads();
                let mut text = format!(
                    "Selected {}. Run /upload to send them.",
                    file_names(uploads.pending_selection())
                );
                if uploads.pending_selection().len() > uploads.remaining_quota() {
                    text = format!(
                        "{text}\n\nOnly {} more documents fit in this session, so the upload will be rejected.",
                        uploads.remaining_quota()
                    );
                }
                self.add_notice(&text);
            }
        } else if command.is_upload() {
            if command.args.is_empty() || self.select_files(&command.args) {
                self.upload(tx)?;
            }
        } else if command.is_files() {
            self.refresh_files(tx)?;
        } else if command.is_clear() {
            match self.orchestrator.begin_clear() {
                Ok(request) => tx.send(Action::ClearSession(request))?,
                Err(err) => self.add_error(&err.to_string()),
            }
        }

        return Ok(false);
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.sync_dependants();
        self.scroll.last();
    }

    fn add_notice(&mut self, text: &str) {
        self.add_message(Message::new(Author::UploadiT, text));
    }

    fn add_error(&mut self, text: &str) {
        self.add_message(Message::new_with_type(
            Author::UploadiT,
            MessageType::Error,
            text,
        ));
    }

    /// Replaces the selection when every path is an acceptable document. Otherwise
    /// the problems are reported and the selection is left alone.
    fn select_files(&mut self, paths: &[String]) -> bool {
        let mut handles = vec![];
        let mut problems = vec![];
        for path in paths {
            match FileHandle::from_path(path) {
                Ok(handle) => handles.push(handle),
                Err(err) => problems.push(err.to_string()),
            }
        }

        if !problems.is_empty() {
            self.add_error(&problems.join("\n"));
            return false;
        }

        self.orchestrator.select_files(handles);
        return true;
    }

    fn upload(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        match self.orchestrator.begin_upload() {
            Ok(request) => {
                self.add_notice(&format!("Uploading {}...", file_names(&request.files)));
                tx.send(Action::Upload(request))?;
            }
            Err(err) => self.add_error(&err.to_string()),
        }

        return Ok(());
    }

    fn refresh_files(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        match self.orchestrator.begin_refresh() {
            Ok(request) => tx.send(Action::RefreshFiles(request))?,
            Err(err) => self.add_error(&err.to_string()),
        }

        return Ok(());
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.messages, self.last_known_width.into());

        self.scroll.set_state(
            self.bubble_list.len().try_into().unwrap_or(u16::MAX),
            self.last_known_height,
        );
    }
}
