// src/core/commands/generic/config_get.rs

use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use async_trait::async_trait;
use bytes::Bytes;

/// Represents `CONFIG GET <parameter>`. Only the `GET` subcommand exists;
/// recognised parameters are `dir` and `dbfilename`, anything else reports
/// an empty value.
#[derive(Debug, Clone, Default)]
pub struct ConfigGet {
    pub parameter: Bytes,
}

impl ParseCommand for ConfigGet {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 2 {
            return Err(CitrineError::WrongArgumentCount("config".to_string()));
        }
        if !extract_string(&args[0])?.eq_ignore_ascii_case("get") {
            return Err(CitrineError::SyntaxError);
        }
        Ok(ConfigGet {
            parameter: extract_bytes(&args[1])?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for ConfigGet {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let config = &ctx.state.config;
        let value = match self.parameter.as_ref() {
            b"dir" => config.dir.clone(),
            b"dbfilename" => config.dbfilename.clone(),
            _ => String::new(),
        };
        Ok(RespValue::Array(vec![
            RespValue::BulkString(self.parameter.clone()),
            RespValue::BulkString(value.into()),
        ]))
    }
}
