// src/core/commands/zset/zrem.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `ZREM` command, restricted to a single member. Removing
/// the last member removes the key.
#[derive(Debug, Clone, Default)]
pub struct ZRem {
    pub key: Bytes,
    pub member: Bytes,
}

impl ParseCommand for ZRem {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 2 {
            return Err(CitrineError::WrongArgumentCount("zrem".to_string()));
        }
        Ok(ZRem {
            key: extract_bytes(&args[0])?,
            member: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZRem {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let removed = ctx.state.keyspace.zrem(&self.key, &self.member)?;
        Ok(RespValue::Integer(removed as i64))
    }
}
