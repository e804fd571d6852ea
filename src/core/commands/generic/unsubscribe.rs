// src/core/commands/generic/unsubscribe.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::ParseCommand;
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Represents the `UNSUBSCRIBE` command. An empty channel list means
/// "unsubscribe from everything".
#[derive(Debug, Clone, Default)]
pub struct Unsubscribe {
    pub channels: Vec<Bytes>,
}

impl ParseCommand for Unsubscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        Ok(Unsubscribe {
            channels: args.iter().map(extract_bytes).collect::<Result<_, _>>()?,
        })
    }
}
