// src/core/commands/list/lpop.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, parse_int};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `LPOP` command.
///
/// Without a count the reply is a single bulk string (null bulk when the key
/// is missing). With a positive count the reply is an array of up to that
/// many elements, empty when the key is missing. A count of zero or less is
/// rejected at parse time.
#[derive(Debug, Clone, Default)]
pub struct LPop {
    pub key: Bytes,
    pub count: Option<usize>,
}

impl ParseCommand for LPop {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        match args {
            [key] => Ok(LPop {
                key: extract_bytes(key)?,
                count: None,
            }),
            [key, count] => {
                let count = parse_int(count)?;
                if count <= 0 {
                    return Err(CitrineError::NotAnInteger);
                }
                Ok(LPop {
                    key: extract_bytes(key)?,
                    count: Some(count as usize),
                })
            }
            _ => Err(CitrineError::WrongArgumentCount("lpop".to_string())),
        }
    }
}

#[async_trait]
impl ExecutableCommand for LPop {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        match self.count {
            None => {
                let mut popped = ctx.state.keyspace.list_pop_front(&self.key, 1)?;
                match popped.pop() {
                    Some(value) => Ok(RespValue::BulkString(value)),
                    None => Ok(RespValue::Null),
                }
            }
            Some(count) => {
                let popped = ctx.state.keyspace.list_pop_front(&self.key, count)?;
                Ok(RespValue::Array(
                    popped.into_iter().map(RespValue::BulkString).collect(),
                ))
            }
        }
    }
}
