// src/core/commands/list/lrange.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `LRANGE` command with inclusive, possibly negative indices.
#[derive(Debug, Clone, Default)]
pub struct LRange {
    pub key: Bytes,
    pub start: i64,
    pub end: i64,
}

impl ParseCommand for LRange {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 3 {
            return Err(CitrineError::WrongArgumentCount("lrange".to_string()));
        }
        Ok(LRange {
            key: extract_bytes(&args[0])?,
            start: parse_index(&args[1])?,
            end: parse_index(&args[2])?,
        })
    }
}

fn parse_index(frame: &RespFrame) -> Result<i64, CitrineError> {
    extract_string(frame)?
        .parse()
        .map_err(|_| CitrineError::RangeNotAnInteger)
}

#[async_trait]
impl ExecutableCommand for LRange {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let elements = ctx
            .state
            .keyspace
            .list_range(&self.key, self.start, self.end)?;
        Ok(RespValue::Array(
            elements.into_iter().map(RespValue::BulkString).collect(),
        ))
    }
}
