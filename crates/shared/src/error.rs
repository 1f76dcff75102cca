use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EntityKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The command parsed but was rejected by translation.
    Validation,
    /// The request body was not a command at all.
    InvalidBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Field of a [`crate::domain::LogicalCommand`] that caused a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandField {
    Action,
    Side,
    Position,
    Color,
}

impl std::fmt::Display for CommandField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CommandField::Action => "action",
            CommandField::Side => "side",
            CommandField::Position => "position",
            CommandField::Color => "color",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("{field} '{value}' not allowed with {entity}")]
    UnsupportedAction {
        entity: EntityKind,
        field: CommandField,
        value: String,
    },
    #[error("{entity} command requires a {field}")]
    MissingField {
        entity: EntityKind,
        field: CommandField,
    },
    #[error("color '{value}' for {entity} is not a 6-digit hex color")]
    MalformedColor { entity: EntityKind, value: String },
}

impl TranslateError {
    pub fn entity(&self) -> EntityKind {
        match self {
            TranslateError::UnsupportedAction { entity, .. }
            | TranslateError::MissingField { entity, .. }
            | TranslateError::MalformedColor { entity, .. } => *entity,
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(value: TranslateError) -> Self {
        ApiError::new(ErrorCode::Validation, value.to_string())
    }
}
