// src/core/commands/streams/xrange.rs

use super::entry_to_resp;
use crate::core::CitrineError;
use crate::core::commands::command_trait::{ExecutableCommand, ExecutionContext, ParseCommand};
use crate::core::commands::helpers::{extract_bytes, extract_string};
use crate::core::protocol::{RespFrame, RespValue};
use crate::core::storage::data_types::DataValue;
use crate::core::storage::keyspace::Keyspace;
use crate::core::storage::stream::StreamId;
use async_trait::async_trait;
use bytes::Bytes;

/// Represents the `XRANGE` command with its inclusive bounds.
///
/// `-` and `+` denote the absolute minimum and maximum; a bare `ms` bound
/// means `ms-0` at the start and `ms-<max>` at the end.
#[derive(Debug, Clone, Default)]
pub struct XRange {
    pub key: Bytes,
    pub start: StreamId,
    pub end: StreamId,
}

fn parse_start(bound: &str) -> Result<StreamId, CitrineError> {
    if bound == "-" {
        Ok(StreamId::MIN)
    } else {
        bound.parse()
    }
}

fn parse_end(bound: &str) -> Result<StreamId, CitrineError> {
    if bound == "+" {
        Ok(StreamId::MAX)
    } else if bound.contains('-') {
        bound.parse()
    } else {
        let ms = bound.parse().map_err(|_| CitrineError::InvalidStreamId)?;
        Ok(StreamId::new(ms, u64::MAX))
    }
}

impl ParseCommand for XRange {
    fn parse(args: &[RespFrame]) -> Result<Self, CitrineError> {
        if args.len() != 3 {
            return Err(CitrineError::WrongArgumentCount("xrange".to_string()));
        }
        Ok(XRange {
            key: extract_bytes(&args[0])?,
            start: parse_start(&extract_string(&args[1])?)?,
            end: parse_end(&extract_string(&args[2])?)?,
        })
    }
}

#[async_trait]
impl ExecutableCommand for XRange {
    async fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<RespValue, CitrineError> {
        let mut entries = ctx.state.keyspace.lock();
        match Keyspace::live_entry_mut(&mut entries, &self.key) {
            None => Ok(RespValue::Array(Vec::new())),
            Some(entry) => match &entry.data {
                DataValue::Stream(stream) => Ok(RespValue::Array(
                    stream
                        .range(self.start, self.end)
                        .into_iter()
                        .map(entry_to_resp)
                        .collect(),
                )),
                _ => Err(CitrineError::WrongType),
            },
        }
    }
}
