// src/core/commands/zset/zadd.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `ZADD` command, restricted to a single score/member pair.
#[derive(Debug, Clone, Default)]
pub struct ZAdd {
    pub key: Bytes,
    pub score: f64,
    pub member: Bytes,
}

impl ParseCommand for ZAdd {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 3 {
            return Err(CitrineError::WrongArgumentCount("zadd".to_string()));
        }
        // `inf`, `-inf` and `nan` all parse; anything else that fails is a
        // float error.
        let score: f64 = extract_string(&args[1])?
            .parse()
            .map_err(|_| CitrineError::NotAFloat)?;
        Ok(ZAdd {
            key: extract_bytes(&args[0])?,
            score,
            member: extract_bytes(&args[2])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZAdd {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let newly_added = ctx
            .state
            .keyspace
            .zadd(&self.key, self.member.clone(), self.score)?;
        Ok(RespValue::Integer(newly_added as i64))
    }
}
