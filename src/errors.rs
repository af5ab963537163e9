use thiserror::Error;

/// Numeric classification of every failure the library can report.
///
/// The discriminants are stable so hosts can log them or switch on them
/// across versions; use [`ErrorCode::label_for`] when the value came from
/// an untrusted or newer source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// No error.
    Ok = 0,
    /// Malformed caller input.
    InvalidArgument = 1,
    /// The context has been closed and no longer owns an evaluator.
    NoEvaluator = 2,
    /// The chunk could not be compiled.
    LoadFailed = 3,
    /// Lua raised an error while executing a chunk or a config function,
    /// including instruction-limit aborts.
    CallFailed = 4,
    /// Path or key-list structural error: empty component, or an
    /// intermediate value that is not a table.
    BadKey = 5,
    /// The terminal value has the wrong type.
    TypeMismatch = 6,
    /// The terminal value is nil.
    NotFound = 7,
    /// Allocation failed while copying a string result.
    ResourceExhausted = 8,
}

impl ErrorCode {
    /// Fixed human-readable label for this code.
    pub fn label(self) -> &'static str {
        match self {
            ErrorCode::Ok => "Ok",
            ErrorCode::InvalidArgument => "Invalid argument",
            ErrorCode::NoEvaluator => "No evaluator",
            ErrorCode::LoadFailed => "Load failed",
            ErrorCode::CallFailed => "Call failed",
            ErrorCode::BadKey => "Bad key",
            ErrorCode::TypeMismatch => "Type mismatch",
            ErrorCode::NotFound => "Not found",
            ErrorCode::ResourceExhausted => "Resource exhausted",
        }
    }

    /// Label for a raw numeric code. Unknown values map to `""` so callers
    /// can format codes from newer library versions without panicking.
    pub fn label_for(raw: u32) -> &'static str {
        match Self::from_raw(raw) {
            Some(code) => code.label(),
            None => "",
        }
    }

    /// The code for a raw numeric value, if it is one we define.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => ErrorCode::Ok,
            1 => ErrorCode::InvalidArgument,
            2 => ErrorCode::NoEvaluator,
            3 => ErrorCode::LoadFailed,
            4 => ErrorCode::CallFailed,
            5 => ErrorCode::BadKey,
            6 => ErrorCode::TypeMismatch,
            7 => ErrorCode::NotFound,
            8 => ErrorCode::ResourceExhausted,
            _ => return None,
        })
    }
}

/// An error from a configuration operation.
///
/// The `Display` text is the user-facing message; for traversal errors it
/// names the offending key or path prefix. [`ConfError::code`] gives the
/// numeric classification.
#[derive(Debug, Error)]
pub enum ConfError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("Lua state gone")]
    NoEvaluator,

    /// Compile error; the message is Lua's own description.
    #[error("{0}")]
    LoadFailed(String),

    /// Runtime error from executing a chunk or calling a config function.
    #[error("{0}")]
    CallFailed(String),

    /// Empty path component, empty key list, or non-table intermediate.
    #[error("{0}")]
    BadKey(String),

    #[error("Not {expected}: {key}")]
    TypeMismatch {
        /// Article-bearing type phrase: "a boolean", "an integer", ...
        expected: &'static str,
        key: String,
    },

    // Deliberately empty message, matching the historical behavior hosts
    // pattern-match on.
    #[error("")]
    NotFound,

    #[error("Copying string result for: {0}")]
    ResourceExhausted(String),
}

impl ConfError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            ConfError::NoEvaluator => ErrorCode::NoEvaluator,
            ConfError::LoadFailed(_) => ErrorCode::LoadFailed,
            ConfError::CallFailed(_) => ErrorCode::CallFailed,
            ConfError::BadKey(_) => ErrorCode::BadKey,
            ConfError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            ConfError::NotFound => ErrorCode::NotFound,
            ConfError::ResourceExhausted(_) => ErrorCode::ResourceExhausted,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfError>;
