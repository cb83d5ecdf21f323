use std::io;

/// Errors that can occur while declaring, resolving or applying injections
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Declaration error: {0}")]
    DeclarationError(String),

    #[error("Duplicate injection name: {0}")]
    DuplicateInjection(String),

    #[error("Lifecycle error: {0}")]
    LifecycleError(String),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command already registered: {0}")]
    CommandExists(String),

    #[error("Command is not a group: {0}")]
    NotAGroup(String),

    #[error("Invalid command name: {0:?}")]
    InvalidCommandName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for injector operations
pub type Result<T> = std::result::Result<T, Error>;
