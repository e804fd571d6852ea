// src/core/commands/generic/subscribe.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::ParseCommand;
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Represents the `SUBSCRIBE` command. Execution lives in the router's
/// pub/sub actions because it mutates session state.
#[derive(Debug, Clone, Default)]
pub struct Subscribe {
    pub channels: Vec<Bytes>,
}

impl ParseCommand for Subscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.is_empty() {
            return Err(CitrineError::WrongArgumentCount("subscribe".to_string()));
        }
        Ok(Subscribe {
            channels: args.iter().map(extract_bytes).collect::<Result<_, _>>()?,
        })
    }
}
