use tui_textarea::Input;

use super::AskRequest;
use super::BackendResult;
use super::ClearRequest;
use super::RefreshRequest;
use super::SessionId;
use super::UploadReceipt;
use super::UploadRequest;

pub enum Event {
    AskFinished(AskRequest, BackendResult<String>),
    FilesRefreshed(RefreshRequest, BackendResult<Vec<String>>),
    SessionCleared(ClearRequest, BackendResult<()>),
    SessionCreated(BackendResult<SessionId>),
    UploadFinished(UploadRequest, BackendResult<UploadReceipt>),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UIResize(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
    UITick(),
}
