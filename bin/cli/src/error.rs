//! Error types for the CLI.

use std::fmt;
use std::path::PathBuf;

/// Reasons a command could not produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// A file could not be read.
    ReadFailed { path: PathBuf, message: String },
    /// A file did not contain a valid workflow.
    InvalidWorkflow { path: PathBuf, message: String },
    /// The run input was not valid JSON.
    InvalidInput { message: String },
    /// The engine refused to run the workflow.
    Rejected { message: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { path, message } => {
                write!(f, "failed to read {}: {message}", path.display())
            }
            Self::InvalidWorkflow { path, message } => {
                write!(f, "{} is not a valid workflow: {message}", path.display())
            }
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::Rejected { message } => write!(f, "workflow rejected: {message}"),
        }
    }
}

impl std::error::Error for CliError {}
