//! Error types for the task manager.
//!
//! Lookups that miss are not errors: the store reports them as `None` or `false`.
//! This enum covers what can actually go wrong: disk I/O, malformed JSON, bad user
//! input, and attempts to build a cyclic subtask tree.

use thiserror::Error;

/// Exit codes used by the `tm` binary.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for task manager operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(u64),

    #[error("Task not found: {0}")]
    TaskNotFound(u64),

    #[error("Task {child} cannot become a subtask of task {parent}: it would contain itself")]
    CyclicSubtask { parent: u64, child: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidDate(_)
            | Error::InvalidArgument(_)
            | Error::ProjectNotFound(_)
            | Error::TaskNotFound(_)
            | Error::CyclicSubtask { .. } => exit_codes::USER_ERROR,

            Error::Io(_) | Error::Json(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for task manager operations.
pub type Result<T> = std::result::Result<T, Error>;
