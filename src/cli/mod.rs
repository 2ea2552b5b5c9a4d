//! Batch runner support for the `cfgtool` binary.
//!
//! Kept in the library so other tools can drive scripts the same way.

mod run;

pub use run::{execute_run, CommandFailure, RunOptions, RunReport};

use std::io;
use thiserror::Error;

/// Errors that stop the runner before or around script execution
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid tree snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] crate::EngineError),

    #[error("No commands given. Pass them as arguments, use --file, or pipe them to stdin.")]
    NoInput,
}
