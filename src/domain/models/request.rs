use tokio_util::sync::CancellationToken;

use super::FileHandle;
use super::SessionId;

// Owned snapshots of everything a network call needs. They are handed out by the
// `begin_*` half of an operation so the call can run away from the state it was
// validated against.

#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub session_id: SessionId,
    pub files: Vec<FileHandle>,
    pub cancel: CancellationToken,
}

#[derive(Clone, Debug)]
pub struct RefreshRequest {
    pub session_id: SessionId,
    /// Inventory generation at the time the request was issued.
    pub generation: u64,
    /// Identifies the listing. Only the newest one issued is applied.
    pub ticket: u64,
    pub cancel: CancellationToken,
}

#[derive(Clone, Debug)]
pub struct AskRequest {
    pub session_id: SessionId,
    pub question: String,
    pub cancel: CancellationToken,
}

#[derive(Clone, Debug)]
pub struct ClearRequest {
    pub session_id: SessionId,
    pub cancel: CancellationToken,
}
