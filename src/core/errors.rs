// src/core/errors.rs

//! Defines the primary error type for the entire application.
//!
//! The `Display` implementation of each client-facing variant is the exact
//! RESP error payload, so the connection layer can serialise any error with
//! `RespFrame::Error(e.to_string())`.

use std::num::{ParseFloatError, ParseIntError};
use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum CitrineError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR syntax error")]
    SyntaxError,

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArgumentCount(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a valid float")]
    NotAFloat,

    #[error("ERR timeout is not a float")]
    TimeoutNotAFloat,

    #[error("ERR start or end is not an integer")]
    RangeNotAnInteger,

    #[error("ERR The ID specified in XADD must be greater than 0-0")]
    StreamIdZero,

    #[error("ERR The ID specified in XADD is equal or smaller than the target stream top item")]
    StreamIdTooSmall,

    #[error("ERR Invalid stream ID specified as stream command argument")]
    InvalidStreamId,

    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,

    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,

    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,

    #[error("ERR Can't execute '{0}' when client is subscribed")]
    SubscribedMode(String),

    #[error("ERR {0}")]
    InvalidState(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Persistence Error: {0}")]
    RdbError(String),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// Wrapping it in an Arc makes sharing the underlying error cheap.
impl Clone for CitrineError {
    fn clone(&self) -> Self {
        match self {
            CitrineError::Io(e) => CitrineError::Io(Arc::clone(e)),
            CitrineError::IncompleteData => CitrineError::IncompleteData,
            CitrineError::ProtocolError(s) => CitrineError::ProtocolError(s.clone()),
            CitrineError::UnknownCommand(s) => CitrineError::UnknownCommand(s.clone()),
            CitrineError::SyntaxError => CitrineError::SyntaxError,
            CitrineError::WrongArgumentCount(s) => CitrineError::WrongArgumentCount(s.clone()),
            CitrineError::WrongType => CitrineError::WrongType,
            CitrineError::NotAnInteger => CitrineError::NotAnInteger,
            CitrineError::NotAFloat => CitrineError::NotAFloat,
            CitrineError::TimeoutNotAFloat => CitrineError::TimeoutNotAFloat,
            CitrineError::RangeNotAnInteger => CitrineError::RangeNotAnInteger,
            CitrineError::StreamIdZero => CitrineError::StreamIdZero,
            CitrineError::StreamIdTooSmall => CitrineError::StreamIdTooSmall,
            CitrineError::InvalidStreamId => CitrineError::InvalidStreamId,
            CitrineError::NestedMulti => CitrineError::NestedMulti,
            CitrineError::ExecWithoutMulti => CitrineError::ExecWithoutMulti,
            CitrineError::DiscardWithoutMulti => CitrineError::DiscardWithoutMulti,
            CitrineError::SubscribedMode(s) => CitrineError::SubscribedMode(s.clone()),
            CitrineError::InvalidState(s) => CitrineError::InvalidState(s.clone()),
            CitrineError::Internal(s) => CitrineError::Internal(s.clone()),
            CitrineError::RdbError(s) => CitrineError::RdbError(s.clone()),
        }
    }
}

impl PartialEq for CitrineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CitrineError::Io(e1), CitrineError::Io(e2)) => e1.to_string() == e2.to_string(),
            (CitrineError::ProtocolError(s1), CitrineError::ProtocolError(s2)) => s1 == s2,
            (CitrineError::UnknownCommand(s1), CitrineError::UnknownCommand(s2)) => s1 == s2,
            (CitrineError::WrongArgumentCount(s1), CitrineError::WrongArgumentCount(s2)) => {
                s1 == s2
            }
            (CitrineError::SubscribedMode(s1), CitrineError::SubscribedMode(s2)) => s1 == s2,
            (CitrineError::InvalidState(s1), CitrineError::InvalidState(s2)) => s1 == s2,
            (CitrineError::Internal(s1), CitrineError::Internal(s2)) => s1 == s2,
            (CitrineError::RdbError(s1), CitrineError::RdbError(s2)) => s1 == s2,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for CitrineError {
    fn from(e: std::io::Error) -> Self {
        CitrineError::Io(Arc::new(e))
    }
}

impl From<ParseIntError> for CitrineError {
    fn from(_: ParseIntError) -> Self {
        CitrineError::NotAnInteger
    }
}

impl From<ParseFloatError> for CitrineError {
    fn from(_: ParseFloatError) -> Self {
        CitrineError::NotAFloat
    }
}

impl From<std::str::Utf8Error> for CitrineError {
    fn from(_: std::str::Utf8Error) -> Self {
        CitrineError::WrongType
    }
}

impl From<std::string::FromUtf8Error> for CitrineError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        CitrineError::WrongType
    }
}
