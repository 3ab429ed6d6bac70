//! Error taxonomy for a watch session.
//!
//! Usage errors never reach this module: clap reports them and exits before
//! anything is started.

use std::process::ExitStatus;
use thiserror::Error;

/// Failure to run the watched command.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The program could not be started at all.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran but exited unsuccessfully.
    #[error("`{command}` exited with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        /// Combined stdout/stderr captured from the failing run.
        output: String,
    },

    /// Waiting on the child process failed.
    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The stop signal fired while the command was in flight.
    #[error("command cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Output captured from the failing run, if any.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            ExecutionError::Failed { output, .. } if !output.trim().is_empty() => Some(output),
            _ => None,
        }
    }
}

/// Failure of the interactive terminal session.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to set up terminal: {0}")]
    Setup(#[source] std::io::Error),

    #[error("failed to draw frame: {0}")]
    Draw(#[source] std::io::Error),

    #[error("failed to read terminal input: {0}")]
    Input(#[source] std::io::Error),

    #[error("TUI thread panicked")]
    Panicked,
}

/// Anything that ends a watch session abnormally.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
