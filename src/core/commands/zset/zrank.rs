// src/core/commands/zset/zrank.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `ZRANK` command: the member's 0-based index in
/// `(score, member)` order, or a null bulk when absent.
#[derive(Debug, Clone, Default)]
pub struct ZRank {
    pub key: Bytes,
    pub member: Bytes,
}

impl ParseCommand for ZRank {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 2 {
            return Err(CitrineError::WrongArgumentCount("zrank".to_string()));
        }
        Ok(ZRank {
            key: extract_bytes(&args[0])?,
            member: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZRank {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        match ctx.state.keyspace.zrank(&self.key, &self.member)? {
            Some(rank) => Ok(RespValue::Integer(rank as i64)),
            None => Ok(RespValue::Null),
        }
    }
}
