//! Error types raised by the knowledge layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// No service instance could be reached within the allowed wait.
    #[error("knowledge service unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, KnowledgeError>;
