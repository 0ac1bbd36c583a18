use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Only .{0} files are supported")]
    UnsupportedExtension(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Command not found: {0}")]
    ToolNotFound(String),

    #[error("Failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timeout after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
