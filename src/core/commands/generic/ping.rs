// src/core/commands/generic/ping.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::ParseCommand;
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Represents the `PING` command with its optional message.
///
/// Outside subscribed mode it replies `+PONG` (or the message as a bulk
/// string); in subscribed mode the reply is the `["pong", message]` array.
/// The reply shaping lives in the router because it depends on session state.
#[derive(Debug, Clone, Default)]
pub struct Ping {
    pub message: Option<Bytes>,
}

impl ParseCommand for Ping {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        match args {
            [] => Ok(Ping { message: None }),
            [message] => Ok(Ping {
                message: Some(extract_bytes(message)?),
            }),
            _ => Err(CitrineError::WrongArgumentCount("ping".to_string())),
        }
    }
}
