#[cfg(test)]
#[path = "upload_coordinator_test.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use super::SessionManager;
use crate::domain::models::with_cancel;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendResult;
use crate::domain::models::FileHandle;
use crate::domain::models::Operation;
use crate::domain::models::OrchestratorError;
use crate::domain::models::RefreshRequest;
use crate::domain::models::UploadReceipt;
use crate::domain::models::UploadRequest;
use crate::domain::models::UploadedFile;
use crate::domain::models::MAX_FILES;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub message: String,
    pub accepted_files: Vec<UploadedFile>,
    /// The server acknowledged the upload without listing the inventory. It has to
    /// be fetched before the local list can be trusted again.
    pub needs_refresh: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced,
    /// A newer inventory was applied while the listing was in flight.
    Superseded,
}

/// Owns the pending selection and the server-confirmed inventory. The inventory
/// is only ever replaced with what the server reports, never edited locally.
#[derive(Default)]
pub struct UploadCoordinator {
    pending: Vec<FileHandle>,
    uploaded: Vec<UploadedFile>,
    uploading: Option<CancellationToken>,
    refreshing: Option<(u64, CancellationToken)>,
    refresh_tickets: u64,
    generation: u64,
}

impl UploadCoordinator {
    pub fn select_files(&mut self, handles: Vec<FileHandle>) {
        self.pending = handles;
    }

    pub fn pending_selection(&self) -> &[FileHandle] {
        return &self.pending;
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        return &self.uploaded;
    }

    pub fn is_uploading(&self) -> bool {
        return self.uploading.is_some();
    }

    pub fn is_refreshing(&self) -> bool {
        return self.refreshing.is_some();
    }

    pub fn remaining_quota(&self) -> usize {
        return MAX_FILES.saturating_sub(self.uploaded.len());
    }

    pub fn begin_upload(
        &mut self,
        session: &SessionManager,
    ) -> Result<UploadRequest, OrchestratorError> {
        if self.uploading.is_some() {
            return Err(OrchestratorError::UploadInProgress);
        }

        if self.pending.is_empty() {
            return Err(OrchestratorError::EmptySelection);
        }

        let session_id = session.session_id()?.clone();

        if self.uploaded.len() + self.pending.len() > MAX_FILES {
            return Err(OrchestratorError::QuotaExceeded {
                uploaded: self.uploaded.len(),
                selected: self.pending.len(),
                max: MAX_FILES,
            });
        }

        let cancel = CancellationToken::new();
        self.uploading = Some(cancel.clone());

        tracing::debug!(
            session_id = %session_id,
            files = self.pending.len(),
            "Upload started"
        );

        return Ok(UploadRequest {
            session_id,
            files: self.pending.clone(),
            cancel,
        });
    }

    pub fn finish_upload(
        &mut self,
        request: &UploadRequest,
        res: BackendResult<UploadReceipt>,
    ) -> Result<UploadOutcome, OrchestratorError> {
        self.uploading = None;

        let receipt = match res {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::error!(error = ?err, "Upload failed");
                return Err(OrchestratorError::backend(Operation::Upload, err));
            }
        };

        let mut needs_refresh = true;
        if let Some(names) = receipt.uploaded_files {
            self.replace_inventory(names);
            needs_refresh = false;
        }

        // A selection made while the upload was in flight is kept for the next one.
        if self.pending == request.files {
            self.pending.clear();
        }

        tracing::debug!(
            uploaded = self.uploaded.len(),
            needs_refresh = needs_refresh,
            "Upload finished"
        );

        return Ok(UploadOutcome {
            message: receipt.message,
            accepted_files: self.uploaded.clone(),
            needs_refresh,
        });
    }

    pub fn cancel_upload(&self) -> bool {
        if let Some(cancel) = &self.uploading {
            cancel.cancel();
            return true;
        }

        return false;
    }

    /// One listing is live at a time. Starting another cancels the one in flight,
    /// whose result is then reported as superseded.
    pub fn begin_refresh(
        &mut self,
        session: &SessionManager,
    ) -> Result<RefreshRequest, OrchestratorError> {
        let session_id = session.session_id()?.clone();

        if let Some((ticket, cancel)) = self.refreshing.take() {
            tracing::debug!(ticket = ticket, "Cancelling superseded file listing");
            cancel.cancel();
        }

        self.refresh_tickets += 1;
        let cancel = CancellationToken::new();
        self.refreshing = Some((self.refresh_tickets, cancel.clone()));

        return Ok(RefreshRequest {
            session_id,
            generation: self.generation,
            ticket: self.refresh_tickets,
            cancel,
        });
    }

    pub fn finish_refresh(
        &mut self,
        request: &RefreshRequest,
        res: BackendResult<Vec<String>>,
    ) -> Result<RefreshOutcome, OrchestratorError> {
        let is_live = matches!(&self.refreshing, Some((ticket, _)) if *ticket == request.ticket);
        if !is_live {
            tracing::debug!(ticket = request.ticket, "Discarding replaced file listing");
            return Ok(RefreshOutcome::Superseded);
        }
        self.refreshing = None;

        let names = match res {
            Ok(names) => names,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to list session files");
                return Err(OrchestratorError::backend(Operation::RefreshFiles, err));
            }
        };

        if request.generation != self.generation {
            tracing::debug!(
                requested = request.generation,
                current = self.generation,
                "Discarding superseded file listing"
            );
            return Ok(RefreshOutcome::Superseded);
        }

        self.replace_inventory(names);
        return Ok(RefreshOutcome::Replaced);
    }

    pub async fn submit_upload(
        &mut self,
        session: &SessionManager,
        backend: &BackendBox,
    ) -> Result<UploadOutcome, OrchestratorError> {
        let request = self.begin_upload(session)?;
        let res = with_cancel(
            &request.cancel,
            backend.upload(&request.session_id, &request.files),
        )
        .await;

        return self.finish_upload(&request, res);
    }

    pub async fn refresh_files(
        &mut self,
        session: &SessionManager,
        backend: &BackendBox,
    ) -> Result<RefreshOutcome, OrchestratorError> {
        let request = self.begin_refresh(session)?;
        let res = with_cancel(&request.cancel, backend.list_files(&request.session_id)).await;

        return self.finish_refresh(&request, res);
    }

    pub(super) fn clear_local(&mut self) {
        if let Some(cancel) = self.uploading.take() {
            cancel.cancel();
        }
        if let Some((_, cancel)) = self.refreshing.take() {
            cancel.cancel();
        }
        self.pending.clear();
        self.uploaded.clear();
        self.generation += 1;
    }

    fn replace_inventory(&mut self, names: Vec<String>) {
        self.uploaded = UploadedFile::from_names(names);
        self.generation += 1;
    }
}
