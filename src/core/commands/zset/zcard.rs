// src/core/commands/zset/zcard.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, validate_arg_count};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `ZCARD` command. A missing key has cardinality 0.
#[derive(Debug, Clone, Default)]
pub struct ZCard {
    pub key: Bytes,
}

impl ParseCommand for ZCard {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        validate_arg_count(args, 1, "zcard")?;
        Ok(ZCard {
            key: extract_bytes(&args[0])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZCard {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let cardinality = ctx.state.keyspace.zcard(&self.key)?;
        Ok(RespValue::Integer(cardinality as i64))
    }
}
