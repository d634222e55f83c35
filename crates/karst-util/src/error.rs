//! Error Module - Karst Error Types
//!
//! One error enumeration serves the whole interpreter. Failures raised deep
//! in the reader, expander or evaluator propagate with `?` to the nearest
//! top-level entry point and are returned to the host; the interpreter never
//! aborts on a user error.

use thiserror::Error;

/// Bare error code, for hosts that dispatch on the kind alone.
///
/// `None` is included so a host-side status slot can encode "no error"
/// without wrapping the code in an `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    None,
    FileOpen,
    ParenUnexpected,
    ParenExpected,
    BadToken,
    BadDefine,
    BadSet,
    BadCond,
    BadAnd,
    BadOr,
    BadLet,
    BadLambda,
    BadQuote,
    UnknownVar,
    BadOp,
    UnknownEval,
    BadArg,
    OutOfBounds,
}

impl ErrorKind {
    /// Human-readable string table for the bare codes.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::None => "no error",
            ErrorKind::FileOpen => "could not open file",
            ErrorKind::ParenUnexpected => "unexpected )",
            ErrorKind::ParenExpected => "expected )",
            ErrorKind::BadToken => "bad token",
            ErrorKind::BadDefine => "malformed define",
            ErrorKind::BadSet => "malformed set!",
            ErrorKind::BadCond => "malformed cond",
            ErrorKind::BadAnd => "malformed and",
            ErrorKind::BadOr => "malformed or",
            ErrorKind::BadLet => "malformed let",
            ErrorKind::BadLambda => "malformed lambda",
            ErrorKind::BadQuote => "malformed quote",
            ErrorKind::UnknownVar => "unknown variable",
            ErrorKind::BadOp => "operator is not a procedure",
            ErrorKind::UnknownEval => "cannot evaluate expression",
            ErrorKind::BadArg => "bad argument",
            ErrorKind::OutOfBounds => "index out of bounds",
        }
    }
}

/// Main error type for all Karst operations.
///
/// Variants carry extra context where it is cheap to collect (the offending
/// symbol name, the file path, the out-of-range index); the `Display`
/// rendering doubles as the user-facing error string table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KarstError {
    #[error("could not open file: {0}")]
    FileOpen(String),

    #[error("unexpected )")]
    ParenUnexpected,

    #[error("expected )")]
    ParenExpected,

    #[error("bad token: {0}")]
    BadToken(String),

    #[error("malformed define")]
    BadDefine,

    #[error("malformed set!")]
    BadSet,

    #[error("malformed cond")]
    BadCond,

    #[error("malformed and")]
    BadAnd,

    #[error("malformed or")]
    BadOr,

    #[error("malformed let")]
    BadLet,

    #[error("malformed lambda")]
    BadLambda,

    #[error("malformed quote")]
    BadQuote,

    #[error("unknown variable: {0}")]
    UnknownVar(String),

    #[error("operator is not a procedure")]
    BadOp,

    #[error("cannot evaluate expression")]
    UnknownEval,

    #[error("bad argument: {0}")]
    BadArg(String),

    #[error("index {index} out of bounds for length {length}")]
    OutOfBounds { index: usize, length: usize },
}

impl KarstError {
    /// The bare code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KarstError::FileOpen(_) => ErrorKind::FileOpen,
            KarstError::ParenUnexpected => ErrorKind::ParenUnexpected,
            KarstError::ParenExpected => ErrorKind::ParenExpected,
            KarstError::BadToken(_) => ErrorKind::BadToken,
            KarstError::BadDefine => ErrorKind::BadDefine,
            KarstError::BadSet => ErrorKind::BadSet,
            KarstError::BadCond => ErrorKind::BadCond,
            KarstError::BadAnd => ErrorKind::BadAnd,
            KarstError::BadOr => ErrorKind::BadOr,
            KarstError::BadLet => ErrorKind::BadLet,
            KarstError::BadLambda => ErrorKind::BadLambda,
            KarstError::BadQuote => ErrorKind::BadQuote,
            KarstError::UnknownVar(_) => ErrorKind::UnknownVar,
            KarstError::BadOp => ErrorKind::BadOp,
            KarstError::UnknownEval => ErrorKind::UnknownEval,
            KarstError::BadArg(_) => ErrorKind::BadArg,
            KarstError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
        }
    }

    /// True when the error names a malformed surface form, i.e. it was (or
    /// would have been) raised by the reader or the expander rather than at
    /// run time.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ParenUnexpected
                | ErrorKind::ParenExpected
                | ErrorKind::BadToken
                | ErrorKind::BadDefine
                | ErrorKind::BadSet
                | ErrorKind::BadCond
                | ErrorKind::BadAnd
                | ErrorKind::BadOr
                | ErrorKind::BadLet
                | ErrorKind::BadLambda
                | ErrorKind::BadQuote
        )
    }
}

/// Result type alias for Karst operations.
pub type Result<T> = std::result::Result<T, KarstError>;
