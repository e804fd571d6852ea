// src/core/commands/zset/zrange.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `ZRANGE` command. Index handling matches `LRANGE`, applied
/// to the ordered member sequence.
#[derive(Debug, Clone, Default)]
pub struct ZRange {
    pub key: Bytes,
    pub start: i64,
    pub end: i64,
}

impl ParseCommand for ZRange {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 3 {
            return Err(CitrineError::WrongArgumentCount("zrange".to_string()));
        }
        let parse_index = |frame: &RespFrame| -> Result<i64, CitrineError> {
            extract_string(frame)?
                .parse()
                .map_err(|_| CitrineError::RangeNotAnInteger)
        };
        Ok(ZRange {
            key: extract_bytes(&args[0])?,
            start: parse_index(&args[1])?,
            end: parse_index(&args[2])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZRange {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let members = ctx
            .state
            .keyspace
            .zrange(&self.key, self.start, self.end)?;
        Ok(RespValue::Array(
            members.into_iter().map(RespValue::BulkString).collect(),
        ))
    }
}
