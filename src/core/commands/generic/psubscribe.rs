// src/core/commands/generic/psubscribe.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::ParseCommand;
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Represents the `PSUBSCRIBE` command for glob-style pattern subscriptions.
#[derive(Debug, Clone, Default)]
pub struct PSubscribe {
    pub patterns: Vec<Bytes>,
}

impl ParseCommand for PSubscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.is_empty() {
            return Err(CitrineError::WrongArgumentCount("psubscribe".to_string()));
        }
        Ok(PSubscribe {
            patterns: args.iter().map(extract_bytes).collect::<Result<_, _>>()?,
        })
    }
}
