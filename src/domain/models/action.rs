use super::AskRequest;
use super::ClearRequest;
use super::RefreshRequest;
use super::UploadRequest;

/// Network work the UI hands to the actions service. Every request was already
/// validated by the orchestrator before it was sent.
pub enum Action {
    Ask(AskRequest),
    ClearSession(ClearRequest),
    CreateSession(),
    RefreshFiles(RefreshRequest),
    Upload(UploadRequest),
}
