use crate::model::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ticket not found: {0}")]
    NotFound(String),

    #[error("Dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Unknown column '{column}' for persona {persona}")]
    UnknownColumn { persona: String, column: String },

    #[error("Column '{0}' has no stages to move into")]
    EmptyColumn(String),

    #[error("Invalid dependency: {0}")]
    InvalidDependency(String),

    #[error("Could not check requirements for stage {stage}: {reason}")]
    Gate { stage: Stage, reason: String },

    // Display labels; the CLI appends the `--set` hint itself
    #[error("Missing required fields for {stage}: {}", .fields.join(", "))]
    MissingFields { stage: Stage, fields: Vec<String> },

    #[error("Ticket {0} is still blocked and cannot be completed")]
    StillBlocked(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // Conversions for `?` at the storage and config boundary
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Project not initialized. Run 'delivery-hub init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),
}

/// Which part of the error taxonomy a failure belongs to.
///
/// Read failures degrade to empty data, gate and mutation failures abort the
/// action, secondary failures leave the primary action successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Read,
    Gate,
    Mutation,
    Secondary, // Warning notification; the action still succeeds
}

impl BoardError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BoardError::NotFound(_) | BoardError::DependencyNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
