use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use mockito::Server;
use test_utils::document_fixtures;
use tokio_util::sync::CancellationToken;

use super::Orchestrator;
use crate::domain::models::with_cancel;
use crate::domain::models::AskRequest;
use crate::domain::models::BackendBox;
use crate::domain::models::ChatTurn;
use crate::domain::models::FailureState;
use crate::domain::models::FileHandle;
use crate::domain::models::OrchestratorError;
use crate::domain::models::SessionId;
use crate::domain::models::SessionStatus;
use crate::domain::models::UploadReceipt;
use crate::domain::models::UploadRequest;
use crate::domain::models::UploadedFile;
use crate::domain::services::RefreshOutcome;
use crate::infrastructure::backends::docqa::DocQA;

fn backend(server: &Server) -> BackendBox {
    return Box::new(DocQA::new(
        &server.url(),
        Duration::from_millis(200),
        Duration::from_millis(2000),
        Duration::from_millis(2000),
    ));
}

fn handles(count: usize) -> Vec<FileHandle> {
    return document_fixtures()
        .iter()
        .take(count)
        .map(|path| return FileHandle::from_path(path).unwrap())
        .collect();
}

fn names(files: &[UploadedFile]) -> Vec<String> {
    return files.iter().map(|e| return e.name.to_string()).collect();
}

fn session_query() -> Matcher {
    return Matcher::UrlEncoded("session_id".to_string(), "s-1".to_string());
}

async fn mock_session(server: &mut Server) -> mockito::Mock {
    return server
        .mock("POST", "/session")
        .with_status(200)
        .with_body(r#"{"session_id": "s-1"}"#)
        .create_async()
        .await;
}

async fn mock_files(server: &mut Server, body: &str) -> mockito::Mock {
    return server
        .mock("GET", "/session_files")
        .match_query(session_query())
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
}

fn activated(id: &str) -> Result<Orchestrator> {
    let mut orchestrator = Orchestrator::default();
    orchestrator.begin_initialize()?;
    orchestrator.finish_initialize(Ok(SessionId::new(id)))?;

    return Ok(orchestrator);
}

fn restarted(orchestrator: &mut Orchestrator, id: &str) -> Result<()> {
    let clear = orchestrator.begin_clear()?;
    orchestrator.finish_clear(&clear, Ok(()))?;
    orchestrator.begin_initialize()?;
    orchestrator.finish_initialize(Ok(SessionId::new(id)))?;

    return Ok(());
}

async fn started(server: &mut Server, backend: &BackendBox, files: &str) -> Result<Orchestrator> {
    mock_session(server).await;
    mock_files(server, files).await;

    let mut orchestrator = Orchestrator::default();
    orchestrator.initialize(backend).await?;
    orchestrator.refresh_files(backend).await?;

    return Ok(orchestrator);
}

#[tokio::test]
async fn it_initializes_then_refreshes() -> Result<()> {
    let mut server = Server::new_async().await;
    let session_mock = mock_session(&mut server).await;
    let files_mock = mock_files(&mut server, r#"{"files": ["kept.pdf"]}"#).await;
    let backend = backend(&server);

    let mut orchestrator = Orchestrator::default();
    let session_id = orchestrator.initialize(&backend).await?;
    assert_eq!(session_id.as_str(), "s-1");
    assert_eq!(orchestrator.session().status(), SessionStatus::Active);

    let outcome = orchestrator.refresh_files(&backend).await?;
    assert_eq!(outcome, RefreshOutcome::Replaced);
    assert_eq!(names(orchestrator.uploads().uploaded_files()), vec!["kept.pdf"]);

    session_mock.assert_async().await;
    files_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_blocks_everything_when_creation_fails() -> Result<()> {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/session")
        .with_status(500)
        .create_async()
        .await;
    let ask_mock = server.mock("POST", "/ask").expect(0).create_async().await;
    let backend = backend(&server);

    let mut orchestrator = Orchestrator::default();
    let err = orchestrator.initialize(&backend).await.unwrap_err();
    assert_eq!(err.to_string(), "Error creating session.");
    assert_eq!(orchestrator.session().status(), SessionStatus::Failed);

    let err = orchestrator.ask(&backend, "What is X?").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotInitialized));

    ask_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_uploads_and_takes_the_server_inventory() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(&mut server, &backend, r#"{"files": []}"#).await?;

    let upload_mock = server
        .mock("POST", "/upload")
        .with_status(200)
        .with_body(r#"{"success": true, "message": "ok", "uploaded_files": ["x.pdf", "y.pdf"]}"#)
        .create_async()
        .await;

    orchestrator.select_files(handles(2));
    let outcome = orchestrator.submit_upload(&backend).await?;

    assert!(!outcome.needs_refresh);
    assert_eq!(names(orchestrator.uploads().uploaded_files()), vec!["x.pdf", "y.pdf"]);
    assert!(orchestrator.uploads().pending_selection().is_empty());
    assert!(!orchestrator.uploads().is_uploading());

    upload_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_blocks_uploads_over_quota_locally() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(
        &mut server,
        &backend,
        r#"{"files": ["a.pdf", "b.pdf", "c.pdf", "d.pdf"]}"#,
    )
    .await?;

    let upload_mock = server.mock("POST", "/upload").expect(0).create_async().await;

    orchestrator.select_files(handles(2));
    let err = orchestrator.submit_upload(&backend).await.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"You can upload at most 5 files per session. 4 already uploaded, 2 selected.");
    assert_eq!(err.end_state(), FailureState::PreconditionRejected);
    assert_eq!(orchestrator.uploads().uploaded_files().len(), 4);

    upload_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_refreshes_when_the_upload_omits_the_inventory() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(&mut server, &backend, r#"{"files": []}"#).await?;

    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_body(r#"{"success": true, "message": "alpha.txt uploaded"}"#)
        .create_async()
        .await;
    let files_mock = mock_files(&mut server, r#"{"files": ["alpha.txt"]}"#).await;

    orchestrator.select_files(handles(1));
    let outcome = orchestrator.submit_upload(&backend).await?;
    assert!(outcome.needs_refresh);
    assert!(orchestrator.uploads().uploaded_files().is_empty());

    orchestrator.refresh_files(&backend).await?;
    assert_eq!(names(orchestrator.uploads().uploaded_files()), vec!["alpha.txt"]);

    files_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_asks_and_ignores_empty_questions() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(&mut server, &backend, r#"{"files": []}"#).await?;

    let ask_mock = server
        .mock("POST", "/ask")
        .match_body(Matcher::Json(serde_json::json!({
            "session_id": "s-1",
            "question": "What is X?",
        })))
        .with_status(200)
        .with_body(r#"{"answer": "X is Y"}"#)
        .expect(1)
        .create_async()
        .await;

    let turn = orchestrator.ask(&backend, "What is X?").await?;
    assert_eq!(turn, Some(ChatTurn::new("What is X?", "X is Y")));

    let turn = orchestrator.ask(&backend, "").await?;
    assert_eq!(turn, None);

    assert_eq!(
        orchestrator.conversation().chat(),
        &[ChatTurn::new("What is X?", "X is Y")]
    );
    assert_eq!(orchestrator.conversation().input(), "");

    ask_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_clears_a_populated_session() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(&mut server, &backend, r#"{"files": []}"#).await?;

    server
        .mock("POST", "/upload")
        .with_status(200)
        .with_body(r#"{"success": true, "message": "ok", "uploaded_files": ["x.pdf", "y.pdf"]}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/ask")
        .with_status(200)
        .with_body(r#"{"answer": "sure"}"#)
        .create_async()
        .await;
    let clear_mock = server
        .mock("POST", "/clear_session")
        .match_query(session_query())
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    orchestrator.select_files(handles(2));
    orchestrator.submit_upload(&backend).await?;
    for question in ["one", "two", "three"] {
        orchestrator.ask(&backend, question).await?;
    }
    assert_eq!(orchestrator.conversation().chat().len(), 3);
    assert_eq!(orchestrator.uploads().uploaded_files().len(), 2);

    orchestrator.clear_session(&backend).await?;

    assert!(orchestrator.conversation().chat().is_empty());
    assert!(orchestrator.uploads().uploaded_files().is_empty());
    assert!(orchestrator.uploads().pending_selection().is_empty());
    assert_eq!(orchestrator.session().status(), SessionStatus::Cleared);
    assert!(!orchestrator.is_clearing());

    clear_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_makes_no_call_to_clear_without_a_session() -> Result<()> {
    let mut server = Server::new_async().await;
    let clear_mock = server
        .mock("POST", "/clear_session")
        .expect(0)
        .create_async()
        .await;
    let backend = backend(&server);

    let mut orchestrator = Orchestrator::default();
    let err = orchestrator.clear_session(&backend).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::NotInitialized));
    clear_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_starts_over_after_a_clear() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(&mut server, &backend, r#"{"files": []}"#).await?;

    server
        .mock("POST", "/clear_session")
        .match_query(Matcher::Any)
        .with_status(200)
        .create_async()
        .await;

    orchestrator.clear_session(&backend).await?;
    let session_id = orchestrator.initialize(&backend).await?;

    assert_eq!(session_id.as_str(), "s-1");
    assert_eq!(orchestrator.session().status(), SessionStatus::Active);

    return Ok(());
}

#[tokio::test]
async fn it_resolves_cancelled_calls_as_failures() -> Result<()> {
    let mut server = Server::new_async().await;
    let backend = backend(&server);
    let mut orchestrator = started(&mut server, &backend, r#"{"files": []}"#).await?;

    orchestrator.set_input("What is X?");
    let request = orchestrator.begin_ask()?.unwrap();
    assert!(orchestrator.cancel_ask());

    let res = with_cancel(
        &request.cancel,
        backend.ask(&request.session_id, &request.question),
    )
    .await;
    let err = orchestrator.finish_ask(&request, res).unwrap_err();

    assert_eq!(err.end_state(), FailureState::RolledBack);
    assert!(orchestrator.conversation().chat().is_empty());
    assert_eq!(orchestrator.conversation().input(), "What is X?");
    assert!(!orchestrator.conversation().is_loading());

    return Ok(());
}

#[test]
fn it_rejects_new_work_while_clearing() -> Result<()> {
    let mut orchestrator = activated("old")?;
    orchestrator.select_files(handles(1));
    orchestrator.set_input("late question");

    let clear = orchestrator.begin_clear()?;

    assert!(matches!(
        orchestrator.begin_ask(),
        Err(OrchestratorError::ClearInProgress)
    ));
    assert!(matches!(
        orchestrator.begin_upload(),
        Err(OrchestratorError::ClearInProgress)
    ));
    assert!(matches!(
        orchestrator.begin_refresh(),
        Err(OrchestratorError::ClearInProgress)
    ));
    assert!(!orchestrator.conversation().is_loading());
    assert!(!orchestrator.uploads().is_uploading());
    assert!(!orchestrator.uploads().is_refreshing());

    orchestrator.finish_clear(&clear, Ok(()))?;
    orchestrator.begin_initialize()?;
    orchestrator.finish_initialize(Ok(SessionId::new("new")))?;

    assert!(orchestrator.conversation().chat().is_empty());
    assert!(orchestrator.uploads().uploaded_files().is_empty());
    assert!(orchestrator.uploads().pending_selection().is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_refuses_async_work_while_clearing() -> Result<()> {
    let mut server = Server::new_async().await;
    let ask_mock = server.mock("POST", "/ask").expect(0).create_async().await;
    let upload_mock = server.mock("POST", "/upload").expect(0).create_async().await;
    let backend = backend(&server);

    let mut orchestrator = activated("s-1")?;
    orchestrator.begin_clear()?;

    let err = orchestrator.ask(&backend, "What is X?").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ClearInProgress));

    orchestrator.select_files(handles(1));
    let err = orchestrator.submit_upload(&backend).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ClearInProgress));
    assert_eq!(orchestrator.uploads().pending_selection().len(), 1);

    ask_mock.assert_async().await;
    upload_mock.assert_async().await;

    return Ok(());
}

#[test]
fn it_drops_results_addressed_to_a_cleared_session() -> Result<()> {
    let mut orchestrator = activated("old")?;
    restarted(&mut orchestrator, "new")?;

    let answer = AskRequest {
        session_id: SessionId::new("old"),
        question: "late question".to_string(),
        cancel: CancellationToken::new(),
    };
    let err = orchestrator
        .finish_ask(&answer, Ok("stale answer".to_string()))
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::SessionChanged));
    assert_eq!(err.end_state(), FailureState::RolledBack);

    let upload = UploadRequest {
        session_id: SessionId::new("old"),
        files: handles(1),
        cancel: CancellationToken::new(),
    };
    let err = orchestrator
        .finish_upload(
            &upload,
            Ok(UploadReceipt {
                message: "ok".to_string(),
                uploaded_files: Some(vec!["old.pdf".to_string()]),
            }),
        )
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::SessionChanged));

    assert!(orchestrator.conversation().chat().is_empty());
    assert!(orchestrator.uploads().uploaded_files().is_empty());
    assert_eq!(orchestrator.session().session_id()?.as_str(), "new");

    return Ok(());
}

#[test]
fn it_drops_results_that_arrive_before_a_new_session() -> Result<()> {
    let mut orchestrator = activated("old")?;
    let clear = orchestrator.begin_clear()?;
    orchestrator.finish_clear(&clear, Ok(()))?;

    let answer = AskRequest {
        session_id: SessionId::new("old"),
        question: "late question".to_string(),
        cancel: CancellationToken::new(),
    };

    assert!(matches!(
        orchestrator.finish_ask(&answer, Ok("stale answer".to_string())),
        Err(OrchestratorError::SessionChanged)
    ));
    assert!(orchestrator.conversation().chat().is_empty());

    return Ok(());
}

#[test]
fn it_drops_a_listing_started_before_the_clear() -> Result<()> {
    let mut orchestrator = activated("old")?;
    let refresh = orchestrator.begin_refresh()?;

    restarted(&mut orchestrator, "new")?;
    assert!(refresh.cancel.is_cancelled());

    let outcome = orchestrator.finish_refresh(&refresh, Ok(vec!["old.pdf".to_string()]))?;

    assert_eq!(outcome, RefreshOutcome::Superseded);
    assert!(orchestrator.uploads().uploaded_files().is_empty());

    return Ok(());
}

#[test]
fn it_keeps_only_the_newest_listing() -> Result<()> {
    let mut orchestrator = activated("s-1")?;
    let first = orchestrator.begin_refresh()?;
    let second = orchestrator.begin_refresh()?;

    assert!(first.cancel.is_cancelled());
    assert!(orchestrator.uploads().is_refreshing());

    let outcome = orchestrator.finish_refresh(&second, Ok(vec!["b.pdf".to_string()]))?;
    assert_eq!(outcome, RefreshOutcome::Replaced);
    assert!(!orchestrator.uploads().is_refreshing());

    let outcome = orchestrator.finish_refresh(&first, Ok(vec!["a.pdf".to_string()]))?;
    assert_eq!(outcome, RefreshOutcome::Superseded);
    assert_eq!(names(orchestrator.uploads().uploaded_files()), vec!["b.pdf"]);

    return Ok(());
}
