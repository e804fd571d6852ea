// src/core/commands/zset/zscore.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::extract_bytes;
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `ZSCORE` command: the member's score as a bulk string, or
/// a null bulk when the key or member is absent.
#[derive(Debug, Clone, Default)]
pub struct ZScore {
    pub key: Bytes,
    pub member: Bytes,
}

impl ParseCommand for ZScore {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 2 {
            return Err(CitrineError::WrongArgumentCount("zscore".to_string()));
        }
        Ok(ZScore {
            key: extract_bytes(&args[0])?,
            member: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ZScore {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        match ctx.state.keyspace.zscore(&self.key, &self.member)? {
            Some(score) => Ok(RespValue::BulkString(format_score(score).into())),
            None => Ok(RespValue::Null),
        }
    }
}

/// Formats a score the way clients expect: integral floats without a
/// fractional part, infinities as `inf`/`-inf`.
pub fn format_score(score: f64) -> String {
    if score == f64::INFINITY {
        "inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else if score.is_nan() {
        "nan".to_string()
    } else {
        score.to_string()
    }
}
