//! Error types raised by the arbitration engine.

use thiserror::Error;

use crate::sensor::SensorType;

/// Errors surfaced by engine components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A sensor's committed value was read before its first `sync`.
    #[error("sensor '{name}' value is not initialized")]
    UninitializedSensor { name: String },

    /// A sensor delivered a value of a type the consuming activator cannot use.
    #[error("sensor '{name}' has value type {actual}, expected {expected}")]
    WrongValueType {
        name: String,
        expected: SensorType,
        actual: SensorType,
    },

    /// A component referenced a sensor name that is not registered.
    #[error("unknown sensor '{0}'")]
    UnknownSensor(String),

    /// A sensor with the same planner-safe name is already registered.
    #[error("sensor '{0}' is already registered")]
    DuplicateSensor(String),

    /// A goal with the same name is already registered.
    #[error("goal '{0}' is already registered")]
    DuplicateGoal(String),

    /// A behavior with the same name is already registered.
    #[error("behavior '{0}' is already registered")]
    DuplicateBehavior(String),

    /// A linear activator was configured with identical zero and full
    /// activation values.
    #[error("linear activator range must not be zero (zero == full == {0})")]
    InvalidRange(f64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
