use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("data too short: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("invalid {kind} value: {detail}")]
    InvalidValue { kind: String, detail: String },

    #[error("argument {index} does not match parameter type {expected}")]
    TypeMismatch { index: usize, expected: String },

    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("log topic {got} does not match event {event}")]
    TopicMismatch { event: String, got: String },

    #[error("event {event} is missing topic for indexed field {field}")]
    MissingTopic { event: String, field: String },

    #[error("event has no field named {0}")]
    NoSuchField(String),

    #[error("field {field} is not a {expected}")]
    FieldType { field: String, expected: String },
}
