// src/core/commands/generic/punsubscribe.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::ParseCommand;
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::RespFrame;
use bytes::Bytes;

/// Represents the `PUNSUBSCRIBE` command. An empty pattern list means
/// "unsubscribe from every pattern".
#[derive(Debug, Clone, Default)]
pub struct PUnsubscribe {
    pub patterns: Vec<Bytes>,
}

impl ParseCommand for PUnsubscribe {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        Ok(PUnsubscribe {
            patterns: args.iter().map(extract_bytes).collect::<Result<_, _>>()?,
        })
    }
}
