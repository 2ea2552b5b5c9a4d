//! Error kinds and the per-engine error record.
//!
//! Every failing engine call produces an [`EngineError`]. The engine also
//! keeps an [`ErrorInfo`] describing the most recent call so that callers
//! which only see a status (the command interpreter, foreign bindings) can
//! ask what went wrong.

use serde::Serialize;
use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a path expression failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathErrorKind {
    #[error("empty path expression")]
    Empty,
    #[error("empty step between slashes")]
    EmptyStep,
    #[error("path ends with a slash")]
    TrailingSlash,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("dangling escape at end of path")]
    DanglingEscape,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("number too large")]
    NumberTooLarge,
    #[error("expected a step, found {0}")]
    ExpectedStep(String),
    #[error("unsupported predicate")]
    UnknownPredicate,
    #[error("expected ']', found {0}")]
    UnclosedPredicate(String),
    #[error("expected a string literal after comparison, found {0}")]
    ExpectedLiteral(String),
    #[error("last()+1 is only allowed alone on the final step")]
    MisplacedAppend,
    #[error("last()+1 cannot be used with this operation")]
    AppendNotAllowed,
    #[error("unexpected {0} after step")]
    TrailingInput(String),
}

/// A path compilation failure and the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct PathError {
    pub kind: PathErrorKind,
    pub offset: usize,
}

impl PathError {
    pub fn new(kind: PathErrorKind, offset: usize) -> Self {
        PathError { kind, offset }
    }
}

/// Errors returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid path expression `{path}`: {source}")]
    InvalidPath { path: String, source: PathError },

    #[error("path `{path}` matches {count} nodes")]
    MultipleMatches { path: String, count: usize },

    #[error("no node matches `{path}`")]
    NoMatch { path: String },

    #[error("cannot move `{src}` into its own descendant `{dst}`")]
    MoveIntoDescendant { src: String, dst: String },

    #[error("cannot create `{path}`: {reason}")]
    CannotCreate { path: String, reason: String },

    #[error("{0}")]
    BadArgument(String),

    #[error("engine instance has been closed")]
    InstanceClosed,
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::InvalidPath { .. } => ErrorCode::InvalidPath,
            EngineError::MultipleMatches { .. } => ErrorCode::MultipleMatches,
            EngineError::NoMatch { .. } => ErrorCode::NoMatch,
            EngineError::MoveIntoDescendant { .. } => ErrorCode::MoveIntoDescendant,
            EngineError::CannotCreate { .. } => ErrorCode::CannotCreate,
            EngineError::BadArgument(_) => ErrorCode::BadArgument,
            EngineError::InstanceClosed => ErrorCode::InstanceClosed,
        }
    }

    pub(crate) fn invalid_path(path: &str, source: PathError) -> Self {
        EngineError::InvalidPath {
            path: path.to_string(),
            source,
        }
    }

    /// Call-specific description stored in [`ErrorInfo::details`]
    fn details(&self) -> String {
        match self {
            EngineError::InvalidPath { path, source } => {
                let at = floor_char_boundary(path, source.offset);
                format!("{}|=|{} ({})", &path[..at], &path[at..], source.kind)
            }
            EngineError::MultipleMatches { path, count } => {
                format!("{} matches {} nodes", path, count)
            }
            EngineError::NoMatch { path } => path.clone(),
            EngineError::MoveIntoDescendant { src, dst } => format!("{} -> {}", src, dst),
            EngineError::CannotCreate { path, reason } => format!("{}: {}", path, reason),
            EngineError::BadArgument(msg) => msg.clone(),
            EngineError::InstanceClosed => "the instance was closed".to_string(),
        }
    }
}

fn floor_char_boundary(s: &str, mut at: usize) -> usize {
    if at >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

/// Closed set of error codes with stable numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NoError = 0,
    InvalidPath = 3,
    NoMatch = 4,
    MultipleMatches = 5,
    MoveIntoDescendant = 10,
    BadArgument = 12,
    CannotCreate = 13,
    InstanceClosed = 14,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Fixed human-readable description of the code
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NoError => "No error",
            ErrorCode::InvalidPath => "Invalid path expression",
            ErrorCode::NoMatch => "No match for path expression",
            ErrorCode::MultipleMatches => "Too many matches for path expression",
            ErrorCode::MoveIntoDescendant => "Cannot move node into its descendant",
            ErrorCode::BadArgument => "Invalid argument in function call",
            ErrorCode::CannotCreate => "Cannot create node for path expression",
            ErrorCode::InstanceClosed => "Instance has been closed",
        }
    }
}

/// Structured description of the last failing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
    pub details: String,
    /// Byte offset of the offending construct; only set for path errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minor: Option<usize>,
}

impl Default for ErrorInfo {
    fn default() -> Self {
        ErrorInfo {
            code: ErrorCode::NoError,
            message: ErrorCode::NoError.message().to_string(),
            details: String::new(),
            minor: None,
        }
    }
}

impl From<&EngineError> for ErrorInfo {
    fn from(err: &EngineError) -> Self {
        let code = err.code();
        let minor = match err {
            EngineError::InvalidPath { source, .. } => Some(source.offset),
            _ => None,
        };
        ErrorInfo {
            code,
            message: code.message().to_string(),
            details: err.details(),
            minor,
        }
    }
}

impl ErrorInfo {
    pub fn is_error(&self) -> bool {
        self.code != ErrorCode::NoError
    }
}

/// Holds the outcome of the most recent engine call.
///
/// Success resets the record to [`ErrorCode::NoError`]; failure replaces it.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    last: ErrorInfo,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.last = ErrorInfo::default();
    }

    pub fn record(&mut self, err: &EngineError) {
        self.last = ErrorInfo::from(err);
    }

    pub fn last(&self) -> &ErrorInfo {
        &self.last
    }
}
