use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::BackendError;
use super::BackendResult;
use super::FileHandle;
use super::SessionId;

/// Server acknowledgement of an upload. `uploaded_files` is the full inventory
/// for the session when the server reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub message: String,
    pub uploaded_files: Option<Vec<String>>,
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend is reachable before a session is
    /// requested.
    async fn health_check(&self) -> BackendResult<()>;

    /// Asks the server to issue a new session identifier.
    async fn create_session(&self) -> BackendResult<SessionId>;

    /// Submits one or more documents for ingestion into the session.
    ///
    /// On success the server reports which documents the session now holds,
    /// which may be fewer than were submitted if some failed to parse.
    async fn upload(&self, session_id: &SessionId, files: &[FileHandle])
        -> BackendResult<UploadReceipt>;

    /// Lists the documents the server holds for the session, in server order.
    async fn list_files(&self, session_id: &SessionId) -> BackendResult<Vec<String>>;

    /// Asks a question against every document in the session.
    async fn ask(&self, session_id: &SessionId, question: &str) -> BackendResult<String>;

    /// Invalidates the session and deletes everything the server derived from it.
    async fn clear_session(&self, session_id: &SessionId) -> BackendResult<()>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;

/// Resolves to `BackendError::Cancelled` as soon as `cancel` fires, dropping the
/// in-flight call.
pub async fn with_cancel<T, F>(cancel: &CancellationToken, call: F) -> BackendResult<T>
where
    F: Future<Output = BackendResult<T>>,
{
    tokio::select! {
        _ = cancel.cancelled() => {
            return Err(BackendError::Cancelled);
        }
        res = call => {
            return res;
        }
    }
}
