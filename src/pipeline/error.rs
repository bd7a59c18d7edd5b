//! Pipeline-specific error types.

use crate::error::SdbError;
use thiserror::Error;

/// Errors that can occur while parsing, building or running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("no command named \"{0}\" found")]
    UnknownCommand(String),

    #[error("multiple ! not supported")]
    MultipleShellEscapes,

    #[error("empty command in pipeline")]
    EmptyCommand,

    #[error("can not coerce {from} to {to} for \"{stage}\" command")]
    Coercion {
        from: String,
        to: String,
        stage: String,
    },

    #[error("command \"{stage}\" does not handle input of type {actual}")]
    TypeMismatch { stage: String, actual: String },

    #[error("no walker found for input of type {actual}")]
    NoWalker { actual: String },

    #[error("no pretty printer found for input of type {actual}")]
    NoPrinter { actual: String },

    #[error("command \"{stage}\" requires an input")]
    RequiresInput { stage: String },

    #[error("{stage}: {message}")]
    Command { stage: String, message: String },

    #[error("invalid argument for \"{stage}\": {message}")]
    InvalidArgument { stage: String, message: String },

    #[error(transparent)]
    Target(#[from] SdbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shell error: {0}")]
    Shell(String),
}

impl PipelineError {
    /// A domain error raised by a stage's own logic
    pub fn command(stage: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Command {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(stage: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::InvalidArgument {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Broken pipes end a run silently: the reader went away early.
    pub fn is_benign(&self) -> bool {
        match self {
            PipelineError::Io(e) => e.kind() == std::io::ErrorKind::BrokenPipe,
            _ => false,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
