// src/core/commands/string/set.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use crate::core::storage::data_types::now_ms;
use async_trait::async_trait;
use bytes::Bytes;

/// The TTL option recognised by `SET`: at most one of `EX <sec>` / `PX <ms>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtlOption {
    #[default]
    None,
    Seconds(i64),
    Milliseconds(i64),
}

/// Represents the `SET` command with its TTL option.
#[derive(Debug, Clone, Default)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: TtlOption,
}

impl ParseCommand for Set {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() < 2 {
            return Err(CitrineError::WrongArgumentCount("set".to_string()));
        }
        let mut cmd = Set {
            key: extract_bytes(&args[0])?,
            value: extract_bytes(&args[1])?,
            ..Default::default()
        };

        let mut rest = args[2..].iter();
        if let Some(option) = rest.next() {
            let option = extract_string(option)?;
            let duration = rest
                .next()
                .ok_or(CitrineError::SyntaxError)
                .and_then(|frame| {
                    extract_string(frame)?
                        .parse::<i64>()
                        .map_err(|_| CitrineError::NotAnInteger)
                })?;
            cmd.ttl = if option.eq_ignore_ascii_case("ex") {
                TtlOption::Seconds(duration)
            } else if option.eq_ignore_ascii_case("px") {
                TtlOption::Milliseconds(duration)
            } else {
                return Err(CitrineError::SyntaxError);
            };
        }
        // A single TTL option is the whole option surface.
        if rest.next().is_some() {
            return Err(CitrineError::SyntaxError);
        }
        Ok(cmd)
    }
}

#[async_trait]
impl ExecutableCommand for Set {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let expiry = match self.ttl {
            TtlOption::None => None,
            TtlOption::Seconds(secs) => Some(now_ms().saturating_add_signed(secs.saturating_mul(1000))),
            TtlOption::Milliseconds(ms) => Some(now_ms().saturating_add_signed(ms)),
        };
        ctx.state
            .keyspace
            .set_string(self.key.clone(), self.value.clone(), expiry);
        Ok(RespValue::ok())
    }
}
