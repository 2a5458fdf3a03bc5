//! Error types shared by the state machine and its collaborators

use thiserror::Error;

use crate::fsm::StateId;

/// Errors reported by [`crate::fsm::StateMachine`]
///
/// All of these are non-fatal: the machine logs them and keeps its
/// current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsmError {
    #[error("unknown state name '{0}'")]
    UnknownState(String),
    #[error("state {0:?} is not registered")]
    Unregistered(StateId),
    #[error("state machine has no current state")]
    NotInitialized,
}

/// Failure of an external collaborator (session SDK, audio, storage)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("{0} unavailable")]
    Unavailable(&'static str),
}
