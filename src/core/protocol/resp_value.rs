// src/core/protocol/resp_value.rs

//! The reply type produced by command execution.

use bytes::Bytes;

/// What a command evaluates to, before wire encoding.
///
/// Handlers build replies out of this type rather than `RespFrame` so the
/// execution layer stays independent of framing concerns; the connection
/// layer converts at the boundary, right before the bytes go out.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    Array(Vec<RespValue>),
    /// "No such value": the null bulk string on the wire.
    Null,
    /// "No data": the null array on the wire.
    NullArray,
}

impl RespValue {
    /// The ubiquitous `+OK` reply.
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".into())
    }
}

impl From<RespValue> for super::RespFrame {
    fn from(value: RespValue) -> Self {
        use super::RespFrame as Frame;
        match value {
            RespValue::SimpleString(text) => Frame::SimpleString(text),
            RespValue::Error(message) => Frame::Error(message),
            RespValue::Integer(n) => Frame::Integer(n),
            RespValue::BulkString(payload) => Frame::BulkString(payload),
            RespValue::Array(items) => {
                Frame::Array(items.into_iter().map(Frame::from).collect())
            }
            RespValue::Null => Frame::Null,
            RespValue::NullArray => Frame::NullArray,
        }
    }
}
