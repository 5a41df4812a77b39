use super::BackendError;
use super::FailureState;
use super::Operation;
use super::OrchestratorError;
use crate::domain::models::SessionStatus;

#[test]
fn it_prefers_the_server_detail() {
    let err = OrchestratorError::backend(
        Operation::Upload,
        BackendError::Api {
            status: 400,
            detail: Some("Unsupported file type".to_string()),
        },
    );

    assert_eq!(err.to_string(), "Unsupported file type");
}

#[test]
fn it_falls_back_to_a_generic_message() {
    let err = OrchestratorError::backend(
        Operation::Ask,
        BackendError::Unreachable("connection refused".to_string()),
    );
    assert_eq!(err.to_string(), "Error connecting to backend.");

    let err = OrchestratorError::backend(
        Operation::ClearSession,
        BackendError::Api {
            status: 500,
            detail: None,
        },
    );
    assert_eq!(err.to_string(), "Error clearing session.");
}

#[test]
fn it_renders_precondition_messages() {
    assert_eq!(
        OrchestratorError::NotInitialized.to_string(),
        "Session not initialized yet."
    );
    assert_eq!(
        OrchestratorError::AlreadyInitialized(SessionStatus::Active).to_string(),
        "Session is already active."
    );
    insta::assert_snapshot!(
        OrchestratorError::QuotaExceeded { uploaded: 4, selected: 2, max: 5 }.to_string(),
        @"You can upload at most 5 files per session. 4 already uploaded, 2 selected."
    );
}

#[test]
fn it_classifies_preconditions() {
    assert_eq!(
        OrchestratorError::EmptySelection.end_state(),
        FailureState::PreconditionRejected
    );
    assert_eq!(
        OrchestratorError::AskInProgress.end_state(),
        FailureState::PreconditionRejected
    );
}

#[test]
fn it_classifies_ambiguous_mutations() {
    let err = OrchestratorError::backend(Operation::ClearSession, BackendError::Timeout);
    assert_eq!(err.end_state(), FailureState::Ambiguous);

    let err = OrchestratorError::backend(
        Operation::Upload,
        BackendError::Api {
            status: 502,
            detail: None,
        },
    );
    assert_eq!(err.end_state(), FailureState::Ambiguous);
}

#[test]
fn it_classifies_rolled_back_failures() {
    let err = OrchestratorError::backend(
        Operation::ClearSession,
        BackendError::Unreachable("connection refused".to_string()),
    );
    assert_eq!(err.end_state(), FailureState::RolledBack);

    let err = OrchestratorError::backend(
        Operation::Upload,
        BackendError::Api {
            status: 400,
            detail: Some("Maximum of 5 files".to_string()),
        },
    );
    assert_eq!(err.end_state(), FailureState::RolledBack);

    let err = OrchestratorError::backend(Operation::Ask, BackendError::Timeout);
    assert_eq!(err.end_state(), FailureState::RolledBack);
}
