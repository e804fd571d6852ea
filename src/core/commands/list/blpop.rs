// src/core/commands/list/blpop.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Represents the `BLPOP` command for a single key.
///
/// The timeout is in (possibly fractional) seconds; zero means wait forever.
#[derive(Debug, Clone, Default)]
pub struct BLPop {
    pub key: Bytes,
    pub timeout: Option<Duration>,
}

impl ParseCommand for BLPop {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 2 {
            return Err(CitrineError::WrongArgumentCount("blpop".to_string()));
        }
        let key = extract_bytes(&args[0])?;
        let seconds: f64 = extract_string(&args[1])?
            .parse()
            .map_err(|_| CitrineError::TimeoutNotAFloat)?;
        if seconds < 0.0 {
            return Err(CitrineError::InvalidState("timeout is negative".to_string()));
        }
        let timeout = if seconds == 0.0 {
            None
        } else {
            Some(
                Duration::try_from_secs_f64(seconds)
                    .map_err(|_| CitrineError::TimeoutNotAFloat)?,
            )
        };
        Ok(BLPop { key, timeout })
    }
}

#[async_trait]
impl ExecutableCommand for BLPop {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        // Inside EXEC replay the command degrades to a non-blocking pop.
        if ctx.in_exec {
            let mut popped = ctx.state.keyspace.list_pop_front(&self.key, 1)?;
            return Ok(match popped.pop() {
                Some(value) => RespValue::Array(vec![
                    RespValue::BulkString(self.key.clone()),
                    RespValue::BulkString(value),
                ]),
                None => RespValue::NullArray,
            });
        }

        ctx.state
            .blocker_manager
            .orchestrate_blpop(&ctx.state.keyspace, ctx.session_id, &self.key, self.timeout)
            .await
    }
}
