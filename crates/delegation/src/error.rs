//! Error types raised by the delegation layer.

use thiserror::Error;

/// Errors surfaced by delegation components.
#[derive(Debug, Error)]
pub enum DelegationError {
    /// A delegation was attempted with no delegation manager registered.
    #[error("no delegation manager registered")]
    NoManagerRegistered,

    /// Registering a delegated goal at the target manager failed. The
    /// local goal state is rolled back when this is raised.
    #[error("sending goal '{goal}' failed: {message}")]
    SendFailed { goal: String, message: String },

    /// The target manager rejected or could not serve a request.
    #[error("endpoint '{endpoint}' error: {message}")]
    Endpoint { endpoint: String, message: String },

    /// A wire goal description could not be mapped onto the target
    /// manager's sensors.
    #[error("invalid goal description: {0}")]
    InvalidGoalDescription(String),
}

pub type Result<T> = std::result::Result<T, DelegationError>;
