//! Error types for the adapter
//!
//! This module defines the error taxonomy surfaced to callers, plus the
//! two-tier SQLSTATE-style translation used by the `error_code` /
//! `error_info` accessors on connections and statements.

use thiserror::Error;

use crate::native::NativeError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the adapter
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unresolvable connection string
    #[error("invalid connection string: {0}")]
    Configuration(String),

    /// Native connect failure not matched by the ignore list
    #[error("connect failed: {0}")]
    Connection(NativeError),

    /// Native parse failure
    #[error("parse failed: {0}")]
    Statement(NativeError),

    /// Native execute failure with the full diagnostic bundle
    #[error(
        "execute failed: ORA-{code:05}: {message} (position {offset})\n\
         statement: {sql}\n\
         bindings: [{bindings}]"
    )]
    Execute {
        /// Native error code
        code: i64,
        /// Native error message
        message: String,
        /// Error offset within the statement text
        offset: u32,
        /// The offending SQL text
        sql: String,
        /// Rendered list of bound values at the time of failure
        bindings: String,
    },

    /// Transaction state machine violation
    #[error("{0}")]
    Transaction(String),

    /// Missing required metadata for a typed bind
    #[error("bind failed: {0}")]
    Bind(String),

    /// Unsupported type or unimplemented optional operation
    #[error("not supported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Build an execute-failure error from a native error record and the
    /// rendered bindings list
    pub(crate) fn execute(e: NativeError, bindings: String) -> Self {
        Error::Execute {
            code: e.code,
            message: e.message,
            offset: e.offset,
            sql: e.sql_text,
            bindings,
        }
    }

    /// Check if this is a transaction state error
    pub fn is_transaction_error(&self) -> bool {
        matches!(self, Error::Transaction(_))
    }

    /// Native error code, when one is attached
    pub fn native_code(&self) -> Option<i64> {
        match self {
            Error::Connection(e) | Error::Statement(e) => Some(e.code),
            Error::Execute { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Success sentinel SQLSTATE code
pub const SQLSTATE_SUCCESS: &str = "00000";

/// General-error SQLSTATE code used for every native error
pub const SQLSTATE_GENERAL: &str = "HY000";

/// Two-tier error record: a generic SQLSTATE-style code plus the native
/// engine code and message.
///
/// The primary code intentionally collapses the engine's error taxonomy to
/// `HY000`; callers needing precise codes must consult [`ErrorInfo::code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// SQLSTATE-style code: `00000` on success, `HY000` otherwise
    pub sqlstate: &'static str,
    /// Native engine error code, if any
    pub code: Option<i64>,
    /// Native engine error message, if any
    pub message: Option<String>,
}

impl ErrorInfo {
    /// The success sentinel `("00000", None, None)`
    pub fn success() -> Self {
        Self {
            sqlstate: SQLSTATE_SUCCESS,
            code: None,
            message: None,
        }
    }

    /// Translate an optional native error record
    pub fn from_native(e: Option<&NativeError>) -> Self {
        match e {
            None => Self::success(),
            Some(e) => Self {
                sqlstate: SQLSTATE_GENERAL,
                code: Some(e.code),
                message: Some(e.message.clone()),
            },
        }
    }

    /// Whether this record is the success sentinel
    pub fn is_success(&self) -> bool {
        self.sqlstate == SQLSTATE_SUCCESS
    }
}
